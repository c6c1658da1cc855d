//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` — safe to
//! re-run on every startup. Produces a convergent result.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected `SQLite` database.
///
/// Creates all four tables idempotently. Safe to call on every startup.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS task (
    id              TEXT PRIMARY KEY NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT,
    status          TEXT NOT NULL CHECK(status IN ('pending','in_progress','completed','deferred','cancelled')),
    priority        TEXT NOT NULL CHECK(priority IN ('critical','high','medium','low')),
    source          TEXT NOT NULL CHECK(source IN ('manual','email','slack','calendar','meeting_notes','agent','voice')),
    priority_score  REAL NOT NULL DEFAULT 0,
    due_date        TEXT,
    initiative_id   TEXT,
    tags            TEXT NOT NULL DEFAULT '[]',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    completed_at    TEXT,
    account_id      TEXT,
    source_ref      TEXT
);

CREATE TABLE IF NOT EXISTS pending_suggestion (
    id              TEXT PRIMARY KEY NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT,
    priority        TEXT NOT NULL CHECK(priority IN ('critical','high','medium','low')),
    due_date        TEXT,
    tags            TEXT NOT NULL DEFAULT '[]',
    confidence      REAL NOT NULL,
    source          TEXT NOT NULL CHECK(source IN ('gmail','slack','granola','calendar')),
    source_ref      TEXT,
    source_url      TEXT,
    reasoning       TEXT NOT NULL,
    item_title      TEXT,
    item_sender     TEXT,
    item_snippet    TEXT,
    status          TEXT NOT NULL CHECK(status IN ('pending','approved','rejected')),
    created_at      TEXT NOT NULL,
    resolved_at     TEXT,
    created_task_id TEXT,
    account_id      TEXT
);

CREATE TABLE IF NOT EXISTS initiative (
    id              TEXT PRIMARY KEY NOT NULL,
    name            TEXT NOT NULL,
    priority        TEXT NOT NULL CHECK(priority IN ('high','medium','low')),
    active          INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS priority_recommendation (
    id                  TEXT PRIMARY KEY NOT NULL,
    task_id             TEXT NOT NULL,
    current_priority    TEXT NOT NULL CHECK(current_priority IN ('critical','high','medium','low')),
    suggested_priority  TEXT NOT NULL CHECK(suggested_priority IN ('critical','high','medium','low')),
    score               REAL NOT NULL,
    reason              TEXT NOT NULL,
    status              TEXT NOT NULL CHECK(status IN ('pending','applied','dismissed')),
    created_at          TEXT NOT NULL,
    resolved_at         TEXT
);

CREATE INDEX IF NOT EXISTS idx_task_status ON task(status);
CREATE INDEX IF NOT EXISTS idx_task_source_ref ON task(source_ref);
CREATE INDEX IF NOT EXISTS idx_suggestion_status ON pending_suggestion(status);
CREATE INDEX IF NOT EXISTS idx_recommendation_status ON priority_recommendation(status);
CREATE INDEX IF NOT EXISTS idx_recommendation_task ON priority_recommendation(task_id);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
