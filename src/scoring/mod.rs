//! Deterministic priority scoring.
//!
//! [`score`] computes a bounded numeric priority from independent weighted
//! factors. It is a pure function of the task, its linked initiative, and
//! the evaluation instant; the same inputs always produce the same score.
//! [`recalculate_all`] applies it in batch to every active task.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::models::initiative::{Initiative, InitiativePriority};
use crate::models::task::{Task, TaskPriority, TaskSource};
use crate::persistence::initiative_repo::InitiativeRepo;
use crate::persistence::task_repo::TaskRepo;
use crate::Result;

/// Upper bound every score is capped at.
const SCORE_CAP: f64 = 100.0;

/// Tags that grant the full urgency bonus.
const URGENT_TAGS: &[&str] = &["urgent", "asap", "critical", "blocking", "blocker"];

/// Tags that grant the smaller importance bonus when no urgent tag matches.
const IMPORTANT_TAGS: &[&str] = &["important", "priority", "key"];

/// Compute the priority score for a task at the given instant.
///
/// The score is the sum of six independent factors, capped at 100:
/// base priority level, due-date urgency, age bonus, source weight,
/// tag bonus, and the linked-initiative bonus.
#[must_use]
pub fn score(task: &Task, initiative: Option<&Initiative>, now: DateTime<Utc>) -> f64 {
    let total = base_level(task.priority)
        + due_urgency(task.due_date, now)
        + age_bonus(task, now)
        + source_weight(task.source)
        + tag_bonus(&task.tags)
        + initiative_bonus(initiative);
    total.min(SCORE_CAP)
}

/// Map a score onto the priority band it falls into.
///
/// Used by the recommendation job to detect divergence between a task's
/// stored priority and what its score implies.
#[must_use]
pub fn band_for_score(value: f64) -> TaskPriority {
    if value >= 75.0 {
        TaskPriority::Critical
    } else if value >= 50.0 {
        TaskPriority::High
    } else if value >= 25.0 {
        TaskPriority::Medium
    } else {
        TaskPriority::Low
    }
}

fn base_level(priority: TaskPriority) -> f64 {
    match priority {
        TaskPriority::Critical => 40.0,
        TaskPriority::High => 30.0,
        TaskPriority::Medium => 20.0,
        TaskPriority::Low => 10.0,
    }
}

fn due_urgency(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(due) = due_date else {
        return 0.0;
    };
    let remaining = due - now;
    if remaining < chrono::Duration::zero() {
        25.0
    } else if remaining <= chrono::Duration::hours(4) {
        23.0
    } else if remaining <= chrono::Duration::hours(24) {
        20.0
    } else if remaining <= chrono::Duration::days(2) {
        15.0
    } else if remaining <= chrono::Duration::days(7) {
        10.0
    } else if remaining <= chrono::Duration::days(14) {
        5.0
    } else {
        0.0
    }
}

/// Age bonus rewards tasks that have sat unresolved; resolved tasks get none.
fn age_bonus(task: &Task, now: DateTime<Utc>) -> f64 {
    if !task.status.is_active() {
        return 0.0;
    }
    let age = now - task.created_at;
    if age >= chrono::Duration::days(14) {
        15.0
    } else if age >= chrono::Duration::days(7) {
        10.0
    } else if age >= chrono::Duration::days(3) {
        5.0
    } else if age >= chrono::Duration::days(1) {
        2.0
    } else {
        0.0
    }
}

fn source_weight(source: TaskSource) -> f64 {
    match source {
        TaskSource::MeetingNotes => 9.0,
        TaskSource::Email => 8.0,
        TaskSource::Slack => 7.0,
        TaskSource::Calendar => 6.0,
        TaskSource::Manual => 5.0,
        TaskSource::Agent | TaskSource::Voice => 4.0,
    }
}

/// Urgent-class tags win over important-class tags; the bonuses never stack.
fn tag_bonus(tags: &[String]) -> f64 {
    let has = |set: &[&str]| {
        tags.iter()
            .any(|tag| set.contains(&tag.to_ascii_lowercase().as_str()))
    };
    if has(URGENT_TAGS) {
        10.0
    } else if has(IMPORTANT_TAGS) {
        5.0
    } else {
        0.0
    }
}

fn initiative_bonus(initiative: Option<&Initiative>) -> f64 {
    match initiative {
        Some(init) if init.active => match init.priority {
            InitiativePriority::High => 10.0,
            InitiativePriority::Medium => 5.0,
            InitiativePriority::Low => 2.0,
        },
        _ => 0.0,
    }
}

/// Re-score every pending or in-progress task and persist the results.
///
/// Completed, cancelled, and deferred tasks are never touched. Returns the
/// number of tasks re-scored. Invoked by the hourly job and after any poll
/// cycle or approval that created tasks.
///
/// # Errors
///
/// Returns `AppError::Db` if listing tasks or persisting a score fails.
pub async fn recalculate_all(tasks: &TaskRepo, initiatives: &InitiativeRepo) -> Result<usize> {
    let active = tasks.list_active().await?;
    let initiative_map: HashMap<String, Initiative> = initiatives
        .list()
        .await?
        .into_iter()
        .map(|init| (init.id.clone(), init))
        .collect();

    let now = Utc::now();
    let mut updated = 0usize;
    for task in &active {
        let initiative = task
            .initiative_id
            .as_deref()
            .and_then(|id| initiative_map.get(id));
        let fresh = score(task, initiative, now);
        if (fresh - task.priority_score).abs() > f64::EPSILON {
            tasks.update_score(&task.id, fresh).await?;
        }
        updated += 1;
        debug!(task_id = %task.id, score = fresh, "task re-scored");
    }

    info!(count = updated, "priority recalculation complete");
    Ok(updated)
}
