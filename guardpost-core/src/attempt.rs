//! Login attempt records mirrored from the append-only log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// One login attempt as stored in the persistent log.
///
/// The log is the single source of truth; everything in memory is a derived
/// view. Records are immutable once appended, and `id` is the monotonically
/// increasing sequence the log assigns on append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttempt {
    /// Sequence id assigned by the log.
    pub id: i64,

    /// The matched account, absent when the login name did not resolve.
    pub user_id: Option<UserId>,

    /// The login name as submitted.
    pub login: String,

    /// The source address of the attempt.
    pub ip: String,

    /// Whether the attempt passed the credential check.
    pub succeeded: bool,

    /// When the attempt was made.
    pub created_at: DateTime<Utc>,
}

/// A login attempt not yet appended to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoginAttempt {
    pub user_id: Option<UserId>,
    pub login: String,
    pub ip: String,
    pub succeeded: bool,
    pub created_at: DateTime<Utc>,
}

impl NewLoginAttempt {
    /// Build an attempt timestamped now.
    pub fn new(
        user_id: Option<UserId>,
        login: impl Into<String>,
        ip: impl Into<String>,
        succeeded: bool,
    ) -> Self {
        Self {
            user_id,
            login: login.into(),
            ip: ip.into(),
            succeeded,
            created_at: Utc::now(),
        }
    }

    /// Attach a sequence id, producing the full record shape.
    ///
    /// Storage backends use the id the log assigned; the guard falls back to
    /// an id of 0 when an append failed and the ledger must still be updated.
    pub fn into_record(self, id: i64) -> LoginAttempt {
        LoginAttempt {
            id,
            user_id: self.user_id,
            login: self.login,
            ip: self.ip,
            succeeded: self.succeeded,
            created_at: self.created_at,
        }
    }
}
