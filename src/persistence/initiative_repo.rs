//! Initiative repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::initiative::{Initiative, InitiativePriority};
use crate::{AppError, Result};

/// Repository wrapper around `SQLite` for initiative records.
#[derive(Clone)]
pub struct InitiativeRepo {
    db: Arc<SqlitePool>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct InitiativeRow {
    id: String,
    name: String,
    priority: String,
    active: bool,
    created_at: String,
}

impl InitiativeRow {
    /// Convert a database row into the domain model.
    fn into_initiative(self) -> Result<Initiative> {
        let priority = InitiativePriority::parse(&self.priority)?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AppError::Db(format!("invalid created_at: {e}")))?;

        Ok(Initiative {
            id: self.id,
            name: self.name,
            priority,
            active: self.active,
            created_at,
        })
    }
}

impl InitiativeRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Insert a new initiative record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, initiative: &Initiative) -> Result<Initiative> {
        sqlx::query(
            "INSERT INTO initiative (id, name, priority, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&initiative.id)
        .bind(&initiative.name)
        .bind(initiative.priority.as_str())
        .bind(initiative.active)
        .bind(initiative.created_at.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;

        Ok(initiative.clone())
    }

    /// Retrieve an initiative by identifier.
    ///
    /// Returns `Ok(None)` if the initiative does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Initiative>> {
        let row: Option<InitiativeRow> = sqlx::query_as("SELECT * FROM initiative WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(InitiativeRow::into_initiative).transpose()
    }

    /// List all initiatives.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list(&self) -> Result<Vec<Initiative>> {
        let rows: Vec<InitiativeRow> =
            sqlx::query_as("SELECT * FROM initiative ORDER BY created_at ASC")
                .fetch_all(self.db.as_ref())
                .await?;

        rows.into_iter().map(InitiativeRow::into_initiative).collect()
    }

    /// Flip an initiative's active flag.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<()> {
        sqlx::query("UPDATE initiative SET active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(self.db.as_ref())
            .await?;

        Ok(())
    }
}
