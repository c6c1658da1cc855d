//! Retention service for time-based data purge.
//!
//! Runs as a background task deleting resolved suggestions and resolved
//! priority recommendations older than `retention_days`. Pending records
//! are never purged.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::Result;

use super::recommendation_repo::RecommendationRepo;
use super::suggestion_repo::SuggestionRepo;

const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawn the retention purge background task.
///
/// The task runs hourly. On each tick it deletes resolved suggestions and
/// recommendations whose resolution is older than `retention_days`.
#[must_use]
pub fn spawn_retention_task(
    db: Arc<SqlitePool>,
    retention_days: u32,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("retention task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(err) = purge(&db, retention_days).await {
                        error!(%err, "retention purge failed");
                    }
                }
            }
        }
    })
}

/// Delete resolved records past the retention window.
///
/// Returns the number of suggestions and recommendations deleted.
///
/// # Errors
///
/// Returns `AppError::Db` if either delete fails.
pub async fn purge(db: &Arc<SqlitePool>, retention_days: u32) -> Result<(u64, u64)> {
    let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));

    let suggestions = SuggestionRepo::new(Arc::clone(db)).cleanup(cutoff).await?;
    let recommendations = RecommendationRepo::new(Arc::clone(db)).cleanup(cutoff).await?;

    info!(retention_days, suggestions, recommendations, "retention purge completed");
    Ok((suggestions, recommendations))
}
