//! SQLite implementation of the user table repository.

use async_trait::async_trait;
use guardpost_core::{
    Error, User, UserId, error::StorageError, repositories::UserRepository,
};
use sqlx::SqlitePool;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteUser {
    id: i64,
    login: String,
    password_hash: String,
    salt: String,
}

impl From<SqliteUser> for User {
    fn from(row: SqliteUser) -> Self {
        User {
            id: UserId::new(row.id),
            login: row.login,
            password_hash: row.password_hash,
            salt: row.salt,
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn all(&self) -> Result<Vec<User>, Error> {
        let rows = sqlx::query_as::<_, SqliteUser>(
            "SELECT id, login, password_hash, salt FROM users",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to scan users table");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
