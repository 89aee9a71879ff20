//! SQLite implementation of the append-only login log.

use async_trait::async_trait;
use chrono::DateTime;
use guardpost_core::{
    Error, LoginAttempt, NewLoginAttempt, UserId, error::StorageError,
    repositories::AttemptLogRepository,
};
use sqlx::SqlitePool;

pub struct SqliteAttemptLogRepository {
    pool: SqlitePool,
}

impl SqliteAttemptLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteLoginAttempt {
    id: i64,
    user_id: Option<i64>,
    login: String,
    ip: String,
    succeeded: i64,
    created_at: i64,
}

impl From<SqliteLoginAttempt> for LoginAttempt {
    fn from(row: SqliteLoginAttempt) -> Self {
        LoginAttempt {
            id: row.id,
            user_id: row.user_id.map(UserId::new),
            login: row.login,
            ip: row.ip,
            succeeded: row.succeeded != 0,
            created_at: DateTime::from_timestamp(row.created_at, 0).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl AttemptLogRepository for SqliteAttemptLogRepository {
    async fn append(&self, attempt: NewLoginAttempt) -> Result<LoginAttempt, Error> {
        let row = sqlx::query_as::<_, SqliteLoginAttempt>(
            r#"
            INSERT INTO login_log (user_id, login, ip, succeeded, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, user_id, login, ip, succeeded, created_at
            "#,
        )
        .bind(attempt.user_id.map(|id| id.as_i64()))
        .bind(&attempt.login)
        .bind(&attempt.ip)
        .bind(i64::from(attempt.succeeded))
        .bind(attempt.created_at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to append login attempt");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        Ok(row.into())
    }

    async fn all_in_order(&self) -> Result<Vec<LoginAttempt>, Error> {
        let rows = sqlx::query_as::<_, SqliteLoginAttempt>(
            "SELECT id, user_id, login, ip, succeeded, created_at FROM login_log ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to scan login log");
            Error::Storage(StorageError::Database(e.to_string()))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
