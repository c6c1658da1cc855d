//! Unit tests for the JSONL decision log writer.

use chrono::Utc;

use task_scout::audit::{
    AuditLogger, DecisionOutcome, DecisionRecord, JsonlAuditWriter, NullAuditLogger,
};

fn sample_record() -> DecisionRecord {
    DecisionRecord::autonomy_gate(
        "Reply to the auditor",
        0.92,
        "auto_low",
        DecisionOutcome::AutoCreate,
        "confidence 0.92 meets the auto_low threshold 0.8".to_owned(),
    )
}

#[test]
fn writes_one_json_line_per_entry() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = JsonlAuditWriter::new(dir.path().to_path_buf()).expect("writer");

    writer.log_entry(sample_record()).expect("first write");
    writer.log_entry(sample_record()).expect("second write");

    let file = dir
        .path()
        .join(format!("decisions-{}.jsonl", Utc::now().date_naive()));
    let contents = std::fs::read_to_string(&file).expect("log file");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    let parsed: serde_json::Value = serde_json::from_str(lines[0]).expect("valid json");
    assert_eq!(parsed["decision"], "autonomy_gate");
    assert_eq!(parsed["outcome"], "auto_create");
    assert_eq!(parsed["context"]["autonomy_level"], "auto_low");
}

#[test]
fn creates_missing_log_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("logs").join("decisions");
    let writer = JsonlAuditWriter::new(nested.clone()).expect("writer");

    writer.log_entry(sample_record()).expect("write");
    assert!(nested.exists());
}

#[test]
fn null_logger_accepts_entries() {
    NullAuditLogger.log_entry(sample_record()).expect("noop");
}
