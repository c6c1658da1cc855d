//! Agent start/stop lifecycle and cross-process exclusion.

use std::sync::Arc;

use serial_test::serial;

use task_scout::policy::AutonomyLevel;
use task_scout::AppError;

use super::test_helpers::{build_agent, empty_registry, StaticExtractor};

async fn idle_agent() -> (
    Arc<task_scout::agent::Agent>,
    Arc<task_scout::persistence::SqlitePool>,
    tempfile::TempDir,
) {
    build_agent(
        empty_registry(),
        Arc::new(StaticExtractor::new(vec![])),
        AutonomyLevel::Suggest,
    )
    .await
}

fn write_lock_record(dir: &tempfile::TempDir, pid: u32) {
    let record = serde_json::json!({
        "pid": pid,
        "started_at": chrono::Utc::now().to_rfc3339(),
    });
    std::fs::write(dir.path().join("agent.lock"), record.to_string()).expect("write lock");
}

#[cfg(unix)]
fn dead_pid() -> u32 {
    let mut child = std::process::Command::new("true")
        .spawn()
        .expect("spawn child");
    let pid = child.id();
    child.wait().expect("wait child");
    pid
}

#[tokio::test]
async fn start_and_stop_flip_the_running_flag() {
    let (agent, _pool, _dir) = idle_agent().await;

    let before = agent.status().await.expect("status");
    assert!(!before.running);

    let started = agent.start(None).await.expect("start");
    assert!(started.running);
    assert!(started.started_at.is_some());

    let stopped = agent.stop().await.expect("stop");
    assert!(!stopped.running);
}

#[tokio::test]
async fn double_start_in_process_conflicts() {
    let (agent, _pool, _dir) = idle_agent().await;

    agent.start(None).await.expect("first start");
    let err = agent.start(None).await.expect_err("second start");
    assert!(matches!(err, AppError::Conflict(_)));

    agent.stop().await.expect("stop");
}

#[tokio::test]
async fn stop_when_not_running_conflicts() {
    let (agent, _pool, _dir) = idle_agent().await;

    let err = agent.stop().await.expect_err("not running");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn restart_after_stop_succeeds() {
    let (agent, _pool, _dir) = idle_agent().await;

    agent.start(None).await.expect("first start");
    agent.stop().await.expect("stop");
    agent.start(None).await.expect("second start");
    agent.stop().await.expect("second stop");
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn start_self_heals_a_stale_lock_record() {
    let (agent, _pool, dir) = idle_agent().await;
    write_lock_record(&dir, dead_pid());

    let status = agent.start(None).await.expect("start over stale lock");
    assert!(status.running);

    agent.stop().await.expect("stop");
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn start_conflicts_with_a_live_lock_holder() {
    let (agent, _pool, dir) = idle_agent().await;
    write_lock_record(&dir, std::process::id());

    let err = agent.start(None).await.expect_err("live holder");
    assert!(matches!(err, AppError::Conflict(_)));

    let status = agent.status().await.expect("status");
    assert!(!status.running);
}

#[tokio::test]
async fn start_applies_the_level_override() {
    let (agent, _pool, _dir) = idle_agent().await;

    let status = agent.start(Some(AutonomyLevel::Auto)).await.expect("start");
    assert_eq!(status.autonomy_level, "auto");

    agent.stop().await.expect("stop");
}

#[tokio::test]
async fn set_autonomy_is_reflected_in_status() {
    let (agent, _pool, _dir) = idle_agent().await;

    let before = agent.status().await.expect("status");
    assert_eq!(before.autonomy_level, "suggest");

    let after = agent.set_autonomy(AutonomyLevel::Full).await.expect("set");
    assert_eq!(after.autonomy_level, "full");
}

#[tokio::test]
async fn poll_now_works_without_a_running_session() {
    let (agent, _pool, _dir) = idle_agent().await;

    let results = agent.poll_now().await.expect("standalone poll");
    assert!(results.is_empty());

    let status = agent.status().await.expect("status");
    assert!(status.last_poll.is_some());
    assert!(!status.running);
}
