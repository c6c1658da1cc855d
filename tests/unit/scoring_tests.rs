//! Unit tests for the priority scoring engine.
//!
//! Validates:
//! - Every score stays within `[0, 100]`
//! - Urgency is monotonic: overdue scores at least as high as due-later
//! - Individual factor tables (base, due, age, source, tags, initiative)
//! - `band_for_score` quartile mapping

use chrono::{Duration, Utc};

use task_scout::models::initiative::{Initiative, InitiativePriority};
use task_scout::models::task::{Task, TaskPriority, TaskSource, TaskStatus};
use task_scout::scoring;

fn base_task() -> Task {
    Task::new("Review quarterly numbers".to_owned(), TaskSource::Manual)
}

#[test]
fn score_stays_within_bounds() {
    let now = Utc::now();
    let mut task = base_task();
    task.priority = TaskPriority::Critical;
    task.due_date = Some(now - Duration::hours(1));
    task.created_at = now - Duration::days(30);
    task.tags = vec!["urgent".to_owned()];
    task.source = TaskSource::MeetingNotes;
    task.initiative_id = Some("init-1".to_owned());

    let initiative = Initiative::new("Launch".to_owned(), InitiativePriority::High);
    let score = scoring::score(&task, Some(&initiative), now);

    assert!(score >= 0.0);
    assert!(score <= 100.0);
}

#[test]
fn overdue_scores_at_least_as_high_as_due_in_seven_days() {
    let now = Utc::now();
    let mut overdue = base_task();
    overdue.due_date = Some(now - Duration::hours(2));
    let mut later = overdue.clone();
    later.due_date = Some(now + Duration::days(7));

    assert!(scoring::score(&overdue, None, now) >= scoring::score(&later, None, now));
}

#[test]
fn base_level_follows_priority_band() {
    let now = Utc::now();
    let mut task = base_task();

    task.priority = TaskPriority::Critical;
    let critical = scoring::score(&task, None, now);
    task.priority = TaskPriority::Low;
    let low = scoring::score(&task, None, now);

    // 40 vs 10 base, all other factors identical.
    assert!((critical - low - 30.0).abs() < f64::EPSILON);
}

#[test]
fn due_urgency_tiers() {
    let now = Utc::now();
    let mut task = base_task();
    let score_at = |task: &Task| scoring::score(task, None, now);

    let no_due = score_at(&task);

    task.due_date = Some(now + Duration::hours(2));
    assert!((score_at(&task) - no_due - 23.0).abs() < f64::EPSILON);

    task.due_date = Some(now + Duration::hours(20));
    assert!((score_at(&task) - no_due - 20.0).abs() < f64::EPSILON);

    task.due_date = Some(now + Duration::hours(40));
    assert!((score_at(&task) - no_due - 15.0).abs() < f64::EPSILON);

    task.due_date = Some(now + Duration::days(5));
    assert!((score_at(&task) - no_due - 10.0).abs() < f64::EPSILON);

    task.due_date = Some(now + Duration::days(10));
    assert!((score_at(&task) - no_due - 5.0).abs() < f64::EPSILON);

    task.due_date = Some(now + Duration::days(30));
    assert!((score_at(&task) - no_due).abs() < f64::EPSILON);

    task.due_date = Some(now - Duration::minutes(5));
    assert!((score_at(&task) - no_due - 25.0).abs() < f64::EPSILON);
}

#[test]
fn age_bonus_only_for_active_tasks() {
    let now = Utc::now();
    let mut task = base_task();
    task.created_at = now - Duration::days(20);

    let active = scoring::score(&task, None, now);
    task.status = TaskStatus::Completed;
    let completed = scoring::score(&task, None, now);

    assert!((active - completed - 15.0).abs() < f64::EPSILON);
}

#[test]
fn age_bonus_tiers() {
    let now = Utc::now();
    let mut task = base_task();
    let score_at = |task: &Task| scoring::score(task, None, now);

    task.created_at = now - Duration::hours(2);
    let fresh = score_at(&task);

    task.created_at = now - Duration::days(1);
    assert!((score_at(&task) - fresh - 2.0).abs() < f64::EPSILON);

    task.created_at = now - Duration::days(4);
    assert!((score_at(&task) - fresh - 5.0).abs() < f64::EPSILON);

    task.created_at = now - Duration::days(8);
    assert!((score_at(&task) - fresh - 10.0).abs() < f64::EPSILON);

    task.created_at = now - Duration::days(15);
    assert!((score_at(&task) - fresh - 15.0).abs() < f64::EPSILON);
}

#[test]
fn source_weight_table() {
    let now = Utc::now();
    let mut task = base_task();
    let score_at = |task: &Task| scoring::score(task, None, now);

    task.source = TaskSource::MeetingNotes;
    let notes = score_at(&task);
    task.source = TaskSource::Email;
    let email = score_at(&task);
    task.source = TaskSource::Slack;
    let slack = score_at(&task);
    task.source = TaskSource::Agent;
    let agent = score_at(&task);

    assert!((notes - email - 1.0).abs() < f64::EPSILON);
    assert!((email - slack - 1.0).abs() < f64::EPSILON);
    assert!((slack - agent - 3.0).abs() < f64::EPSILON);
}

#[test]
fn urgent_tag_wins_over_important_tag() {
    let now = Utc::now();
    let mut task = base_task();
    let score_at = |task: &Task| scoring::score(task, None, now);

    let untagged = score_at(&task);

    task.tags = vec!["important".to_owned()];
    assert!((score_at(&task) - untagged - 5.0).abs() < f64::EPSILON);

    // Both classes present: the urgent bonus applies alone, no stacking.
    task.tags = vec!["important".to_owned(), "blocking".to_owned()];
    assert!((score_at(&task) - untagged - 10.0).abs() < f64::EPSILON);

    task.tags = vec!["ASAP".to_owned()];
    assert!((score_at(&task) - untagged - 10.0).abs() < f64::EPSILON);
}

#[test]
fn initiative_bonus_requires_active_initiative() {
    let now = Utc::now();
    let task = base_task();

    let mut initiative = Initiative::new("Migration".to_owned(), InitiativePriority::High);
    let with_active = scoring::score(&task, Some(&initiative), now);
    initiative.active = false;
    let with_inactive = scoring::score(&task, Some(&initiative), now);
    let without = scoring::score(&task, None, now);

    assert!((with_active - without - 10.0).abs() < f64::EPSILON);
    assert!((with_inactive - without).abs() < f64::EPSILON);
}

#[test]
fn initiative_bonus_tiers() {
    let now = Utc::now();
    let task = base_task();
    let bonus = |priority| {
        let initiative = Initiative::new("X".to_owned(), priority);
        scoring::score(&task, Some(&initiative), now) - scoring::score(&task, None, now)
    };

    assert!((bonus(InitiativePriority::High) - 10.0).abs() < f64::EPSILON);
    assert!((bonus(InitiativePriority::Medium) - 5.0).abs() < f64::EPSILON);
    assert!((bonus(InitiativePriority::Low) - 2.0).abs() < f64::EPSILON);
}

#[test]
fn band_for_score_quartiles() {
    assert_eq!(scoring::band_for_score(90.0), TaskPriority::Critical);
    assert_eq!(scoring::band_for_score(75.0), TaskPriority::Critical);
    assert_eq!(scoring::band_for_score(74.9), TaskPriority::High);
    assert_eq!(scoring::band_for_score(50.0), TaskPriority::High);
    assert_eq!(scoring::band_for_score(49.9), TaskPriority::Medium);
    assert_eq!(scoring::band_for_score(25.0), TaskPriority::Medium);
    assert_eq!(scoring::band_for_score(24.9), TaskPriority::Low);
    assert_eq!(scoring::band_for_score(0.0), TaskPriority::Low);
}
