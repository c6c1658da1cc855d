//! Batch recalculation over mixed task statuses.

use std::sync::Arc;

use task_scout::models::task::{Task, TaskSource, TaskStatus};
use task_scout::persistence::{db, initiative_repo::InitiativeRepo, task_repo::TaskRepo};
use task_scout::scoring;

#[tokio::test]
async fn recalculate_all_skips_resolved_tasks() {
    let pool = Arc::new(db::connect_memory().await.expect("db"));
    let tasks = TaskRepo::new(Arc::clone(&pool));
    let initiatives = InitiativeRepo::new(pool);

    let pending_one = Task::new("Pending one".to_owned(), TaskSource::Email);
    let pending_two = Task::new("Pending two".to_owned(), TaskSource::Slack);
    let completed = Task::new("Already done".to_owned(), TaskSource::Manual);
    tasks.create(&pending_one).await.expect("create");
    tasks.create(&pending_two).await.expect("create");
    tasks.create(&completed).await.expect("create");
    tasks
        .set_status(&completed.id, TaskStatus::Completed)
        .await
        .expect("complete");

    let updated = scoring::recalculate_all(&tasks, &initiatives).await.expect("recalculate");
    assert_eq!(updated, 2);

    let untouched = tasks
        .get_by_id(&completed.id)
        .await
        .expect("query")
        .expect("exists");
    assert!((untouched.priority_score - 0.0).abs() < f64::EPSILON);

    for id in [&pending_one.id, &pending_two.id] {
        let task = tasks.get_by_id(id).await.expect("query").expect("exists");
        assert!(task.priority_score > 0.0);
    }
}

#[tokio::test]
async fn recalculate_all_on_empty_store_returns_zero() {
    let pool = Arc::new(db::connect_memory().await.expect("db"));
    let tasks = TaskRepo::new(Arc::clone(&pool));
    let initiatives = InitiativeRepo::new(pool);

    let updated = scoring::recalculate_all(&tasks, &initiatives).await.expect("recalculate");
    assert_eq!(updated, 0);
}
