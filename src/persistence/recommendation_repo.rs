//! Priority recommendation repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::recommendation::{PriorityRecommendation, RecommendationStatus};
use crate::models::task::TaskPriority;
use crate::{AppError, Result};

/// Repository wrapper around `SQLite` for priority recommendation records.
#[derive(Clone)]
pub struct RecommendationRepo {
    db: Arc<SqlitePool>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct RecommendationRow {
    id: String,
    task_id: String,
    current_priority: String,
    suggested_priority: String,
    score: f64,
    reason: String,
    status: String,
    created_at: String,
    resolved_at: Option<String>,
}

impl RecommendationRow {
    /// Convert a database row into the domain model.
    fn into_recommendation(self) -> Result<PriorityRecommendation> {
        let current_priority = TaskPriority::parse(&self.current_priority)?;
        let suggested_priority = TaskPriority::parse(&self.suggested_priority)?;
        let status = RecommendationStatus::parse(&self.status)?;
        let created_at = parse_timestamp(&self.created_at, "created_at")?;
        let resolved_at = self
            .resolved_at
            .as_deref()
            .map(|s| parse_timestamp(s, "resolved_at"))
            .transpose()?;

        Ok(PriorityRecommendation {
            id: self.id,
            task_id: self.task_id,
            current_priority,
            suggested_priority,
            score: self.score,
            reason: self.reason,
            status,
            created_at,
            resolved_at,
        })
    }
}

fn parse_timestamp(s: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

impl RecommendationRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Insert a new recommendation record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(
        &self,
        recommendation: &PriorityRecommendation,
    ) -> Result<PriorityRecommendation> {
        sqlx::query(
            "INSERT INTO priority_recommendation (id, task_id, current_priority,
             suggested_priority, score, reason, status, created_at, resolved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&recommendation.id)
        .bind(&recommendation.task_id)
        .bind(recommendation.current_priority.as_str())
        .bind(recommendation.suggested_priority.as_str())
        .bind(recommendation.score)
        .bind(&recommendation.reason)
        .bind(recommendation.status.as_str())
        .bind(recommendation.created_at.to_rfc3339())
        .bind(recommendation.resolved_at.map(|dt| dt.to_rfc3339()))
        .execute(self.db.as_ref())
        .await?;

        Ok(recommendation.clone())
    }

    /// List pending recommendations, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<PriorityRecommendation>> {
        let rows: Vec<RecommendationRow> = sqlx::query_as(
            "SELECT * FROM priority_recommendation WHERE status = 'pending'
             ORDER BY created_at ASC",
        )
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter()
            .map(RecommendationRow::into_recommendation)
            .collect()
    }

    /// Count pending recommendations.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count_pending(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM priority_recommendation WHERE status = 'pending'",
        )
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(u64::try_from(count.0).unwrap_or(0))
    }

    /// Whether a pending recommendation already exists for the task.
    ///
    /// Used to keep the recommendation job from stacking duplicates for
    /// the same divergence on every run.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn has_pending_for_task(&self, task_id: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM priority_recommendation
             WHERE task_id = ?1 AND status = 'pending'",
        )
        .bind(task_id)
        .fetch_one(self.db.as_ref())
        .await?;

        Ok(count.0 > 0)
    }

    /// Mark a recommendation as applied.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn mark_applied(&self, id: &str) -> Result<()> {
        self.resolve(id, RecommendationStatus::Applied).await
    }

    /// Mark a recommendation as dismissed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn dismiss(&self, id: &str) -> Result<()> {
        self.resolve(id, RecommendationStatus::Dismissed).await
    }

    async fn resolve(&self, id: &str, status: RecommendationStatus) -> Result<()> {
        let result = sqlx::query(
            "UPDATE priority_recommendation SET status = ?1, resolved_at = ?2
             WHERE id = ?3 AND status = 'pending'",
        )
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyResolved(format!(
                "recommendation {id} is not pending"
            )));
        }
        Ok(())
    }

    /// Purge resolved recommendations older than the cutoff.
    ///
    /// Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM priority_recommendation
             WHERE status != 'pending' AND resolved_at < ?1",
        )
        .bind(older_than.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
