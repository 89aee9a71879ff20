//! Schema setup for the sqlite backend.
//!
//! The schema is the whole persistent surface the core needs: a user table
//! scanned in bulk and an append-only login log whose `id` is the sequence
//! the core relies on. Statements are idempotent; `apply` can run on every
//! startup.

use guardpost_core::{Error, error::StorageError};
use sqlx::SqlitePool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        login TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        salt TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS login_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER,
        login TEXT NOT NULL,
        ip TEXT NOT NULL,
        succeeded INTEGER NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_login_log_ip ON login_log (ip)",
    "CREATE INDEX IF NOT EXISTS idx_login_log_user_id ON login_log (user_id)",
];

pub(crate) async fn apply(pool: &SqlitePool) -> Result<(), Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to apply schema statement");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;
    }
    Ok(())
}
