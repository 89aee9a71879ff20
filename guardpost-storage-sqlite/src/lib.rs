//! SQLite storage backend for the guardpost login guard.
//!
//! Provides the persistent user table and the append-only login log on top
//! of a sqlx [`SqlitePool`], implementing the repository traits from
//! [`guardpost_core::repositories`].

mod migrations;
pub mod repositories;

pub use repositories::{SqliteAttemptLogRepository, SqliteUserRepository};

use guardpost_core::{Error, error::StorageError};
use sqlx::SqlitePool;

/// Connection handle owning the pool and handing out repositories.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Connect to the given database URL (e.g. `sqlite::memory:`).
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `users` and `login_log` tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), Error> {
        migrations::apply(&self.pool).await
    }

    /// Repository over the user table.
    pub fn users(&self) -> SqliteUserRepository {
        SqliteUserRepository::new(self.pool.clone())
    }

    /// Repository over the append-only login log.
    pub fn attempt_log(&self) -> SqliteAttemptLogRepository {
        SqliteAttemptLogRepository::new(self.pool.clone())
    }

    /// Verify the database answers queries.
    pub async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Connection(e.to_string())))?;
        Ok(())
    }
}
