//! Pending suggestion repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::item::SourceType;
use crate::models::suggestion::{ItemContext, PendingSuggestion, SuggestionStatus};
use crate::models::task::{Task, TaskPriority, TaskSource, TaskStatus};
use crate::{AppError, Result};

use super::task_repo::TaskRepo;

/// Repository wrapper around `SQLite` for pending suggestion records.
#[derive(Clone)]
pub struct SuggestionRepo {
    db: Arc<SqlitePool>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct SuggestionRow {
    id: String,
    title: String,
    description: Option<String>,
    priority: String,
    due_date: Option<String>,
    tags: String,
    confidence: f64,
    source: String,
    source_ref: Option<String>,
    source_url: Option<String>,
    reasoning: String,
    item_title: Option<String>,
    item_sender: Option<String>,
    item_snippet: Option<String>,
    status: String,
    created_at: String,
    resolved_at: Option<String>,
    created_task_id: Option<String>,
    account_id: Option<String>,
}

impl SuggestionRow {
    /// Convert a database row into the domain model.
    fn into_suggestion(self) -> Result<PendingSuggestion> {
        let priority = TaskPriority::parse(&self.priority)?;
        let source = SourceType::parse(&self.source)
            .map_err(|_| AppError::Db(format!("invalid suggestion source: {}", self.source)))?;
        let status = SuggestionStatus::parse(&self.status)?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| AppError::Db(format!("invalid tags blob: {e}")))?;

        Ok(PendingSuggestion {
            id: self.id,
            title: self.title,
            description: self.description,
            priority,
            due_date: parse_opt_timestamp(self.due_date.as_deref(), "due_date")?,
            tags,
            confidence: self.confidence,
            source,
            source_ref: self.source_ref,
            source_url: self.source_url,
            reasoning: self.reasoning,
            item_context: ItemContext {
                title: self.item_title,
                sender: self.item_sender,
                snippet: self.item_snippet,
            },
            status,
            created_at: parse_timestamp(&self.created_at, "created_at")?,
            resolved_at: parse_opt_timestamp(self.resolved_at.as_deref(), "resolved_at")?,
            created_task_id: self.created_task_id,
            account_id: self.account_id,
        })
    }
}

fn parse_timestamp(s: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

fn parse_opt_timestamp(s: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>> {
    s.map(|raw| parse_timestamp(raw, field)).transpose()
}

impl SuggestionRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Insert a new pending suggestion record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, suggestion: &PendingSuggestion) -> Result<PendingSuggestion> {
        let tags = serde_json::to_string(&suggestion.tags)
            .map_err(|e| AppError::Db(format!("cannot serialize tags: {e}")))?;

        sqlx::query(
            "INSERT INTO pending_suggestion (id, title, description, priority, due_date,
             tags, confidence, source, source_ref, source_url, reasoning, item_title,
             item_sender, item_snippet, status, created_at, resolved_at, created_task_id,
             account_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
             ?16, ?17, ?18, ?19)",
        )
        .bind(&suggestion.id)
        .bind(&suggestion.title)
        .bind(&suggestion.description)
        .bind(suggestion.priority.as_str())
        .bind(suggestion.due_date.map(|dt| dt.to_rfc3339()))
        .bind(&tags)
        .bind(suggestion.confidence)
        .bind(suggestion.source.as_str())
        .bind(&suggestion.source_ref)
        .bind(&suggestion.source_url)
        .bind(&suggestion.reasoning)
        .bind(&suggestion.item_context.title)
        .bind(&suggestion.item_context.sender)
        .bind(&suggestion.item_context.snippet)
        .bind(suggestion.status.as_str())
        .bind(suggestion.created_at.to_rfc3339())
        .bind(suggestion.resolved_at.map(|dt| dt.to_rfc3339()))
        .bind(&suggestion.created_task_id)
        .bind(&suggestion.account_id)
        .execute(self.db.as_ref())
        .await?;

        Ok(suggestion.clone())
    }

    /// Retrieve a suggestion by identifier.
    ///
    /// Returns `Ok(None)` if the suggestion does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<PendingSuggestion>> {
        let row: Option<SuggestionRow> =
            sqlx::query_as("SELECT * FROM pending_suggestion WHERE id = ?1")
                .bind(id)
                .fetch_optional(self.db.as_ref())
                .await?;

        row.map(SuggestionRow::into_suggestion).transpose()
    }

    /// List pending suggestions in FIFO review order (oldest first).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<PendingSuggestion>> {
        let rows: Vec<SuggestionRow> = sqlx::query_as(
            "SELECT * FROM pending_suggestion WHERE status = 'pending'
             ORDER BY created_at ASC",
        )
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter()
            .map(SuggestionRow::into_suggestion)
            .collect()
    }

    /// Count pending suggestions.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count_pending(&self) -> Result<u64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM pending_suggestion WHERE status = 'pending'")
                .fetch_one(self.db.as_ref())
                .await?;

        Ok(u64::try_from(count.0).unwrap_or(0))
    }

    /// Approve a pending suggestion, creating exactly one task from it.
    ///
    /// The lookup, the pending-status check, the task insert, and the
    /// status flip run in one transaction, all-or-nothing. A second
    /// approval of the same id fails without creating a second task.
    ///
    /// Returns the created task's identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the suggestion does not exist,
    /// `AppError::AlreadyResolved` if it was already approved or rejected,
    /// and `AppError::Db` if any statement fails.
    pub async fn approve(&self, id: &str) -> Result<String> {
        let mut tx = self.db.begin().await?;

        let row: Option<SuggestionRow> =
            sqlx::query_as("SELECT * FROM pending_suggestion WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let suggestion = row
            .ok_or_else(|| AppError::NotFound(format!("suggestion {id} not found")))?
            .into_suggestion()?;

        if suggestion.status != SuggestionStatus::Pending {
            return Err(AppError::AlreadyResolved(format!(
                "suggestion {id} already {}",
                suggestion.status.as_str()
            )));
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: suggestion.title.clone(),
            description: suggestion.description.clone(),
            status: TaskStatus::Pending,
            priority: suggestion.priority,
            source: TaskSource::from(suggestion.source),
            priority_score: 0.0,
            due_date: suggestion.due_date,
            initiative_id: None,
            tags: suggestion.tags.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
            account_id: suggestion.account_id.clone(),
            source_ref: suggestion.source_ref.clone(),
        };
        TaskRepo::insert_with(&mut *tx, &task).await?;

        sqlx::query(
            "UPDATE pending_suggestion
             SET status = 'approved', resolved_at = ?1, created_task_id = ?2
             WHERE id = ?3 AND status = 'pending'",
        )
        .bind(now.to_rfc3339())
        .bind(&task.id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task.id)
    }

    /// Reject a pending suggestion. No task side effect.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the suggestion does not exist,
    /// `AppError::AlreadyResolved` if it was already approved or rejected,
    /// and `AppError::Db` if the update fails.
    pub async fn reject(&self, id: &str) -> Result<()> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("suggestion {id} not found")))?;

        if current.status != SuggestionStatus::Pending {
            return Err(AppError::AlreadyResolved(format!(
                "suggestion {id} already {}",
                current.status.as_str()
            )));
        }

        sqlx::query(
            "UPDATE pending_suggestion SET status = 'rejected', resolved_at = ?1
             WHERE id = ?2 AND status = 'pending'",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    /// Bulk-delete pending suggestions. Resolved records are untouched.
    ///
    /// Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn clear_pending(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM pending_suggestion WHERE status = 'pending'")
            .execute(self.db.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    /// Purge resolved suggestions whose resolution is older than the cutoff.
    ///
    /// Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the delete fails.
    pub async fn cleanup(&self, older_than: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM pending_suggestion
             WHERE status != 'pending' AND resolved_at < ?1",
        )
        .bind(older_than.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
