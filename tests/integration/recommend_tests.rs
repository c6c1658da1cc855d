//! Recommendation pass over diverging priority bands.

use std::sync::Arc;

use chrono::{Duration, Utc};

use task_scout::models::task::{Task, TaskPriority, TaskSource};
use task_scout::persistence::recommendation_repo::RecommendationRepo;
use task_scout::persistence::task_repo::TaskRepo;
use task_scout::policy::AutonomyLevel;

use super::test_helpers::{build_agent, empty_registry, StaticExtractor};

/// A task stored as low priority whose attributes score well into the
/// high band: overdue (25) + urgent tag (10) + meeting notes (9) +
/// two-week age (15) + low base (10) = 69.
fn underrated_task() -> Task {
    let mut task = Task::new("Unblock the deploy".to_owned(), TaskSource::MeetingNotes);
    task.priority = TaskPriority::Low;
    task.due_date = Some(Utc::now() - Duration::hours(3));
    task.created_at = Utc::now() - Duration::days(15);
    task.tags = vec!["blocking".to_owned()];
    task
}

#[tokio::test]
async fn divergence_creates_a_pending_recommendation() {
    let (agent, pool, _dir) = build_agent(
        empty_registry(),
        Arc::new(StaticExtractor::new(vec![])),
        AutonomyLevel::Suggest,
    )
    .await;
    let tasks = TaskRepo::new(Arc::clone(&pool));
    let task = underrated_task();
    tasks.create(&task).await.expect("create");

    let generated = agent.recommend_now().await.expect("recommend");
    assert_eq!(generated, 1);

    let pending = RecommendationRepo::new(Arc::clone(&pool))
        .list_pending()
        .await
        .expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].task_id, task.id);
    assert_eq!(pending[0].current_priority, TaskPriority::Low);
    assert_eq!(pending[0].suggested_priority, TaskPriority::High);

    // Below full autonomy the stored priority is untouched.
    let stored = tasks.get_by_id(&task.id).await.expect("query").expect("exists");
    assert_eq!(stored.priority, TaskPriority::Low);

    let status = agent.status().await.expect("status");
    assert_eq!(status.pending_recommendation_count, 1);
    assert!(status.last_recommendation.is_some());
}

#[tokio::test]
async fn full_autonomy_applies_the_adjustment() {
    let (agent, pool, _dir) = build_agent(
        empty_registry(),
        Arc::new(StaticExtractor::new(vec![])),
        AutonomyLevel::Full,
    )
    .await;
    let tasks = TaskRepo::new(Arc::clone(&pool));
    let task = underrated_task();
    tasks.create(&task).await.expect("create");

    let generated = agent.recommend_now().await.expect("recommend");
    assert_eq!(generated, 1);

    let stored = tasks.get_by_id(&task.id).await.expect("query").expect("exists");
    assert_eq!(stored.priority, TaskPriority::High);

    let repo = RecommendationRepo::new(pool);
    assert_eq!(repo.count_pending().await.expect("count"), 0);
}

#[tokio::test]
async fn repeated_passes_do_not_stack_recommendations() {
    let (agent, pool, _dir) = build_agent(
        empty_registry(),
        Arc::new(StaticExtractor::new(vec![])),
        AutonomyLevel::Suggest,
    )
    .await;
    TaskRepo::new(Arc::clone(&pool))
        .create(&underrated_task())
        .await
        .expect("create");

    assert_eq!(agent.recommend_now().await.expect("first"), 1);
    assert_eq!(agent.recommend_now().await.expect("second"), 0);

    let repo = RecommendationRepo::new(pool);
    assert_eq!(repo.count_pending().await.expect("count"), 1);
}

#[tokio::test]
async fn aligned_tasks_generate_nothing() {
    let (agent, pool, _dir) = build_agent(
        empty_registry(),
        Arc::new(StaticExtractor::new(vec![])),
        AutonomyLevel::Suggest,
    )
    .await;
    // Medium base (20) + manual source (5) = 25, squarely in the medium band.
    let task = Task::new("Tidy the backlog".to_owned(), TaskSource::Manual);
    TaskRepo::new(pool).create(&task).await.expect("create");

    assert_eq!(agent.recommend_now().await.expect("recommend"), 0);
}
