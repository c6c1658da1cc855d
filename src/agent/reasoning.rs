//! Deterministic reasoning text for pending suggestions.
//!
//! The text is an ordered concatenation of up to four sentences:
//! confidence tier, source context, urgency, and detected deadline,
//! joined with `". "` and a trailing period. The same candidate always
//! produces the same text.

use crate::models::extraction::ExtractedTask;
use crate::models::item::SourceType;
use crate::models::task::TaskPriority;

/// Build the reviewer-facing reasoning text for one candidate.
#[must_use]
pub fn suggestion_reasoning(candidate: &ExtractedTask, source: SourceType) -> String {
    let mut sentences = vec![confidence_sentence(candidate.confidence)];
    sentences.push(source_sentence(source));
    if matches!(candidate.priority, TaskPriority::Critical | TaskPriority::High) {
        sentences.push("Priority signals in the content suggest this is urgent");
    }
    if candidate.due_date.is_some() {
        sentences.push("A deadline was detected in the source content");
    }
    format!("{}.", sentences.join(". "))
}

fn confidence_sentence(confidence: f64) -> &'static str {
    if confidence >= 0.8 {
        "High confidence this is an actionable task"
    } else if confidence >= 0.6 {
        "Moderate confidence this is an actionable task"
    } else {
        "Low confidence extraction, may need review"
    }
}

fn source_sentence(source: SourceType) -> &'static str {
    match source {
        SourceType::Gmail => "Derived from an email in your inbox",
        SourceType::Slack => "Raised in a Slack conversation",
        SourceType::Granola => "Captured from recent meeting notes",
        SourceType::Calendar => "Linked to an upcoming calendar event",
    }
}
