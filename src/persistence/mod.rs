//! Persistence layer modules.

pub mod db;
pub mod initiative_repo;
pub mod recommendation_repo;
pub mod retention;
pub mod schema;
pub mod suggestion_repo;
pub mod task_repo;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
