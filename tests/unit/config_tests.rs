//! Unit tests for configuration parsing and validation.

use task_scout::config::GlobalConfig;
use task_scout::models::item::SourceType;
use task_scout::policy::AutonomyLevel;

fn minimal_toml(data_dir: &std::path::Path) -> String {
    format!("data_dir = \"{}\"\n", data_dir.display())
}

#[test]
fn minimal_config_gets_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = GlobalConfig::from_toml_str(&minimal_toml(dir.path())).expect("parse");

    assert_eq!(config.autonomy, AutonomyLevel::Suggest);
    assert_eq!(config.intervals.poll_seconds, 300);
    assert_eq!(config.intervals.recommend_seconds, 1800);
    assert_eq!(config.timeouts.poll_seconds, 30);
    assert_eq!(config.timeouts.extract_seconds, 60);
    assert_eq!(config.retention_days, 30);
    assert!(config.accounts.is_empty());
}

#[test]
fn full_config_parses_accounts_and_levels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        r#"
data_dir = "{}"
autonomy = "auto_low"
retention_days = 7

[intervals]
poll_seconds = 60
recommend_seconds = 600

[[accounts]]
source = "gmail"
account_id = "work"

[[accounts]]
source = "slack"
account_id = "team"
enabled = false

[accounts.settings]
channel = "C012345"

[llm]
model = "gpt-4o"
"#,
        dir.path().display()
    );
    let config = GlobalConfig::from_toml_str(&toml).expect("parse");

    assert_eq!(config.autonomy, AutonomyLevel::AutoLow);
    assert_eq!(config.retention_days, 7);
    assert_eq!(config.intervals.poll_seconds, 60);
    assert_eq!(config.accounts.len(), 2);
    assert_eq!(config.accounts[0].source, SourceType::Gmail);
    assert!(config.accounts[0].enabled);
    assert!(!config.accounts[1].enabled);
    assert_eq!(
        config.accounts[1].settings.get("channel").map(String::as_str),
        Some("C012345")
    );
    assert_eq!(config.llm.model, "gpt-4o");
}

#[test]
fn unknown_autonomy_level_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "data_dir = \"{}\"\nautonomy = \"yolo\"\n",
        dir.path().display()
    );
    assert!(GlobalConfig::from_toml_str(&toml).is_err());
}

#[test]
fn zero_intervals_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "data_dir = \"{}\"\n[intervals]\npoll_seconds = 0\n",
        dir.path().display()
    );
    assert!(GlobalConfig::from_toml_str(&toml).is_err());
}

#[test]
fn zero_timeouts_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let toml = format!(
        "data_dir = \"{}\"\n[timeouts]\nextract_seconds = 0\n",
        dir.path().display()
    );
    assert!(GlobalConfig::from_toml_str(&toml).is_err());
}

#[test]
fn derived_paths_live_under_data_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = GlobalConfig::from_toml_str(&minimal_toml(dir.path())).expect("parse");

    assert!(config.db_path().starts_with(&config.data_dir));
    assert!(config.lock_path().ends_with("agent.lock"));
    assert!(config.decision_log_dir().ends_with("logs"));
}
