//! Unit tests for suggestion reasoning text assembly.

use chrono::Utc;

use task_scout::agent::reasoning::suggestion_reasoning;
use task_scout::models::extraction::ExtractedTask;
use task_scout::models::item::SourceType;
use task_scout::models::task::TaskPriority;

fn candidate(confidence: f64) -> ExtractedTask {
    ExtractedTask::new("Ship release notes".to_owned(), confidence)
}

#[test]
fn reasoning_is_deterministic() {
    let c = candidate(0.9);
    let first = suggestion_reasoning(&c, SourceType::Gmail);
    let second = suggestion_reasoning(&c, SourceType::Gmail);
    assert_eq!(first, second);
}

#[test]
fn high_confidence_plain_candidate() {
    let text = suggestion_reasoning(&candidate(0.85), SourceType::Gmail);
    assert_eq!(
        text,
        "High confidence this is an actionable task. Derived from an email in your inbox."
    );
}

#[test]
fn confidence_tiers() {
    let high = suggestion_reasoning(&candidate(0.8), SourceType::Slack);
    let moderate = suggestion_reasoning(&candidate(0.6), SourceType::Slack);
    let low = suggestion_reasoning(&candidate(0.59), SourceType::Slack);

    assert!(high.starts_with("High confidence"));
    assert!(moderate.starts_with("Moderate confidence"));
    assert!(low.starts_with("Low confidence"));
}

#[test]
fn urgency_sentence_for_high_priority() {
    let mut c = candidate(0.9);
    c.priority = TaskPriority::High;
    let text = suggestion_reasoning(&c, SourceType::Granola);
    assert!(text.contains("urgent"));

    c.priority = TaskPriority::Medium;
    let text = suggestion_reasoning(&c, SourceType::Granola);
    assert!(!text.contains("urgent"));
}

#[test]
fn deadline_sentence_when_due_date_present() {
    let mut c = candidate(0.9);
    c.due_date = Some(Utc::now());
    let text = suggestion_reasoning(&c, SourceType::Calendar);
    assert!(text.contains("deadline was detected"));
    assert!(text.ends_with('.'));
}

#[test]
fn sentences_joined_in_fixed_order() {
    let mut c = candidate(0.9);
    c.priority = TaskPriority::Critical;
    c.due_date = Some(Utc::now());
    let text = suggestion_reasoning(&c, SourceType::Granola);

    let confidence_pos = text.find("High confidence").expect("confidence sentence");
    let source_pos = text.find("meeting notes").expect("source sentence");
    let urgency_pos = text.find("urgent").expect("urgency sentence");
    let deadline_pos = text.find("deadline").expect("deadline sentence");

    assert!(confidence_pos < source_pos);
    assert!(source_pos < urgency_pos);
    assert!(urgency_pos < deadline_pos);
}
