//! Retention purge over resolved suggestions and recommendations.

use std::sync::Arc;

use task_scout::models::item::SourceType;
use task_scout::models::recommendation::PriorityRecommendation;
use task_scout::models::suggestion::PendingSuggestion;
use task_scout::models::task::TaskPriority;
use task_scout::persistence::{
    db, recommendation_repo::RecommendationRepo, retention, suggestion_repo::SuggestionRepo,
};

fn suggestion(title: &str) -> PendingSuggestion {
    PendingSuggestion::new(
        title.to_owned(),
        SourceType::Gmail,
        0.5,
        "Low confidence extraction, may need review.".to_owned(),
    )
}

fn recommendation(task_id: &str) -> PriorityRecommendation {
    PriorityRecommendation::new(
        task_id.to_owned(),
        TaskPriority::Low,
        TaskPriority::Medium,
        30.0,
        "score 30.0 maps to medium but the task is stored as low".to_owned(),
    )
}

#[tokio::test]
async fn purge_removes_resolved_and_keeps_pending() {
    let pool = Arc::new(db::connect_memory().await.expect("db"));
    let suggestions = SuggestionRepo::new(Arc::clone(&pool));
    let recommendations = RecommendationRepo::new(Arc::clone(&pool));

    let resolved_suggestion = suggestion("Old and rejected");
    let pending_suggestion = suggestion("Still waiting");
    suggestions.create(&resolved_suggestion).await.expect("create");
    suggestions.create(&pending_suggestion).await.expect("create");
    suggestions.reject(&resolved_suggestion.id).await.expect("reject");

    let resolved_recommendation = recommendation("task-1");
    let pending_recommendation = recommendation("task-2");
    recommendations.create(&resolved_recommendation).await.expect("create");
    recommendations.create(&pending_recommendation).await.expect("create");
    recommendations.dismiss(&resolved_recommendation.id).await.expect("dismiss");

    // Zero-day retention: everything resolved before this instant is old.
    let (purged_suggestions, purged_recommendations) =
        retention::purge(&pool, 0).await.expect("purge");
    assert_eq!(purged_suggestions, 1);
    assert_eq!(purged_recommendations, 1);

    assert!(suggestions
        .get_by_id(&resolved_suggestion.id)
        .await
        .expect("query")
        .is_none());
    assert_eq!(suggestions.list_pending().await.expect("pending").len(), 1);
    assert_eq!(recommendations.count_pending().await.expect("count"), 1);
}

#[tokio::test]
async fn purge_keeps_records_inside_the_window() {
    let pool = Arc::new(db::connect_memory().await.expect("db"));
    let suggestions = SuggestionRepo::new(Arc::clone(&pool));

    let recent = suggestion("Recently rejected");
    suggestions.create(&recent).await.expect("create");
    suggestions.reject(&recent.id).await.expect("reject");

    let (purged, _) = retention::purge(&pool, 30).await.expect("purge");
    assert_eq!(purged, 0);
    assert!(suggestions.get_by_id(&recent.id).await.expect("query").is_some());
}
