//! Repository trait for the append-only login log.

use async_trait::async_trait;

use crate::{Error, LoginAttempt, NewLoginAttempt};

/// Append-only access to the persistent login log.
///
/// The log is the single source of truth for the
/// [`AttemptLedger`](crate::AttemptLedger) and for the audit queries.
/// Records are immutable once appended; the log assigns each one a
/// monotonically increasing sequence id.
#[async_trait]
pub trait AttemptLogRepository: Send + Sync + 'static {
    /// Append one attempt, returning the record with its assigned sequence id.
    async fn append(&self, attempt: NewLoginAttempt) -> Result<LoginAttempt, Error>;

    /// Fetch the entire log, oldest to newest.
    ///
    /// Used by the full ledger rebuild and by the audit queries.
    async fn all_in_order(&self) -> Result<Vec<LoginAttempt>, Error>;
}
