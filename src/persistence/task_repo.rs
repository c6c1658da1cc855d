//! Task repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::task::{Task, TaskPriority, TaskSource, TaskStatus};
use crate::{AppError, Result};

/// Repository wrapper around `SQLite` for task records.
#[derive(Clone)]
pub struct TaskRepo {
    db: Arc<SqlitePool>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    source: String,
    priority_score: f64,
    due_date: Option<String>,
    initiative_id: Option<String>,
    tags: String,
    created_at: String,
    updated_at: String,
    completed_at: Option<String>,
    account_id: Option<String>,
    source_ref: Option<String>,
}

impl TaskRow {
    /// Convert a database row into the domain model.
    fn into_task(self) -> Result<Task> {
        let status = TaskStatus::parse(&self.status)?;
        let priority = TaskPriority::parse(&self.priority)?;
        let source = TaskSource::parse(&self.source)?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| AppError::Db(format!("invalid tags blob: {e}")))?;

        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
            priority,
            source,
            priority_score: self.priority_score,
            due_date: parse_opt_timestamp(self.due_date.as_deref(), "due_date")?,
            initiative_id: self.initiative_id,
            tags,
            created_at: parse_timestamp(&self.created_at, "created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "updated_at")?,
            completed_at: parse_opt_timestamp(self.completed_at.as_deref(), "completed_at")?,
            account_id: self.account_id,
            source_ref: self.source_ref,
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

impl TaskRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Insert a task record through the given connection.
    ///
    /// Shared by [`TaskRepo::create`] and the suggestion-approval
    /// transaction, which must insert the task atomically with the
    /// suggestion status flip.
    pub(crate) async fn insert_with(
        conn: &mut sqlx::SqliteConnection,
        task: &Task,
    ) -> Result<()> {
        let tags = serde_json::to_string(&task.tags)
            .map_err(|e| AppError::Db(format!("cannot serialize tags: {e}")))?;

        sqlx::query(
            "INSERT INTO task (id, title, description, status, priority, source,
             priority_score, due_date, initiative_id, tags, created_at, updated_at,
             completed_at, account_id, source_ref)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        )
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.source.as_str())
        .bind(task.priority_score)
        .bind(task.due_date.map(|dt| dt.to_rfc3339()))
        .bind(&task.initiative_id)
        .bind(&tags)
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .bind(task.completed_at.map(|dt| dt.to_rfc3339()))
        .bind(&task.account_id)
        .bind(&task.source_ref)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Insert a new task record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, task: &Task) -> Result<Task> {
        let mut conn = self.db.acquire().await?;
        Self::insert_with(&mut conn, task).await?;
        Ok(task.clone())
    }

    /// Retrieve a task by identifier.
    ///
    /// Returns `Ok(None)` if the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM task WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(TaskRow::into_task).transpose()
    }

    /// List every pending or in-progress task.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM task WHERE status IN ('pending', 'in_progress')
             ORDER BY priority_score DESC, created_at ASC",
        )
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    /// Find a task by its source-reference fingerprint.
    ///
    /// Used for best-effort idempotency: an item whose fingerprint already
    /// produced a task is not turned into a second one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn find_by_source_ref(&self, source_ref: &str) -> Result<Option<Task>> {
        let row: Option<TaskRow> =
            sqlx::query_as("SELECT * FROM task WHERE source_ref = ?1 LIMIT 1")
                .bind(source_ref)
                .fetch_optional(self.db.as_ref())
                .await?;

        row.map(TaskRow::into_task).transpose()
    }

    /// Transition a task to a new lifecycle status.
    ///
    /// `completed_at` is set exactly once, on the transition into
    /// `Completed`; it is never overwritten or cleared afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the task does not exist and
    /// `AppError::Conflict` if the transition is not permitted.
    pub async fn set_status(&self, id: &str, next: TaskStatus) -> Result<Task> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task {id} not found")))?;

        if !current.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "cannot transition task {id} from {} to {}",
                current.status.as_str(),
                next.as_str()
            )));
        }

        let now = Utc::now();
        let completed_at = match next {
            TaskStatus::Completed => Some(now.to_rfc3339()),
            _ => current.completed_at.map(|dt| dt.to_rfc3339()),
        };

        sqlx::query(
            "UPDATE task SET status = ?1, updated_at = ?2, completed_at = ?3 WHERE id = ?4",
        )
        .bind(next.as_str())
        .bind(now.to_rfc3339())
        .bind(&completed_at)
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        let mut updated = current;
        updated.status = next;
        updated.updated_at = now;
        updated.completed_at = parse_opt_timestamp(completed_at.as_deref(), "completed_at")?;
        Ok(updated)
    }

    /// Persist a freshly computed priority score.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn update_score(&self, id: &str, score: f64) -> Result<()> {
        sqlx::query("UPDATE task SET priority_score = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(score)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        Ok(())
    }

    /// Persist a priority band adjustment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn update_priority(&self, id: &str, priority: TaskPriority) -> Result<()> {
        sqlx::query("UPDATE task SET priority = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(priority.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        Ok(())
    }
}
