//! Decision engine for the autonomy gate.
//!
//! Determines whether an extracted candidate is created as a task
//! immediately or queued as a pending suggestion for human review. The
//! evaluation is pure and stateless; every call produces an audit record
//! through the caller's [`AuditLogger`](crate::audit::AuditLogger).

use tracing::{info, info_span};

use crate::audit::{DecisionOutcome, DecisionRecord};
use crate::models::extraction::ExtractedTask;
use crate::policy::AutonomyLevel;

/// Confidence at or above which `AutoLow` creates the task directly.
const AUTO_LOW_CONFIDENCE: f64 = 0.8;

/// Result of one autonomy-gate evaluation.
#[derive(Debug, Clone)]
pub struct Decision {
    /// Whether the candidate is auto-created or queued.
    pub outcome: DecisionOutcome,
    /// Human-readable reasoning behind the outcome.
    pub reasoning: String,
}

impl Decision {
    /// Build the append-only audit record for this evaluation.
    #[must_use]
    pub fn to_record(&self, candidate: &ExtractedTask, level: AutonomyLevel) -> DecisionRecord {
        DecisionRecord::autonomy_gate(
            &candidate.title,
            candidate.confidence,
            level.as_str(),
            self.outcome,
            self.reasoning.clone(),
        )
    }
}

/// Evaluate the autonomy gate for one extracted candidate.
///
/// Evaluation table:
/// - `Suggest` always queues.
/// - `AutoLow` creates iff confidence >= 0.8 (boundary inclusive).
/// - `Auto` and `Full` always create.
#[must_use]
pub fn decide(candidate: &ExtractedTask, level: AutonomyLevel) -> Decision {
    let _span = info_span!(
        "autonomy_gate",
        level = %level,
        confidence = candidate.confidence,
    )
    .entered();

    let decision = match level {
        AutonomyLevel::Suggest => Decision {
            outcome: DecisionOutcome::Suggest,
            reasoning: "autonomy level suggest queues every candidate for review".to_owned(),
        },
        AutonomyLevel::AutoLow => {
            if candidate.confidence >= AUTO_LOW_CONFIDENCE {
                Decision {
                    outcome: DecisionOutcome::AutoCreate,
                    reasoning: format!(
                        "confidence {:.2} meets the auto_low threshold {AUTO_LOW_CONFIDENCE}",
                        candidate.confidence
                    ),
                }
            } else {
                Decision {
                    outcome: DecisionOutcome::Suggest,
                    reasoning: format!(
                        "confidence {:.2} is below the auto_low threshold {AUTO_LOW_CONFIDENCE}",
                        candidate.confidence
                    ),
                }
            }
        }
        AutonomyLevel::Auto | AutonomyLevel::Full => Decision {
            outcome: DecisionOutcome::AutoCreate,
            reasoning: format!("autonomy level {level} creates every candidate directly"),
        },
    };

    info!(outcome = ?decision.outcome, "autonomy gate evaluated");
    decision
}
