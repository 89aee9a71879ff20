//! The in-memory attempt ledger.
//!
//! The ledger mirrors the append-only login log: per-user and per-address
//! consecutive-failure counters plus the two most recent successful logins
//! per user. It is updated record-by-record on live traffic and can be
//! rebuilt in full from the log with [`AttemptLedger::rebuild_from_log`],
//! which applies the exact same per-record rule and therefore converges on
//! the same state incremental updates would have produced.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{Error, LoginAttempt, UserId, repositories::AttemptLogRepository};

#[derive(Default)]
struct LedgerState {
    failures_by_user: HashMap<UserId, u32>,
    failures_by_ip: HashMap<String, u32>,
    last_login: HashMap<UserId, LoginAttempt>,
    previous_login: HashMap<UserId, LoginAttempt>,
}

impl LedgerState {
    /// Fold one log record into the derived state. The same rule serves
    /// live traffic and full replay.
    fn apply(&mut self, attempt: &LoginAttempt) {
        if attempt.succeeded {
            if let Some(user_id) = attempt.user_id {
                if let Some(prior) = self.last_login.insert(user_id, attempt.clone()) {
                    self.previous_login.insert(user_id, prior);
                }
                self.failures_by_user.insert(user_id, 0);
            }
            self.failures_by_ip.insert(attempt.ip.clone(), 0);
        } else {
            if let Some(user_id) = attempt.user_id {
                *self.failures_by_user.entry(user_id).or_insert(0) += 1;
            }
            *self.failures_by_ip.entry(attempt.ip.clone()).or_insert(0) += 1;
        }
    }
}

/// In-memory derived view of the login log.
///
/// # Thread Safety
///
/// A single `RwLock` guards the whole state. Every read-modify-write runs
/// under the write lock, so concurrent failures against the same key never
/// lose increments, and a rebuild holds the lock for its entire replay: no
/// reader ever observes a ledger that is partially cleared and partially
/// repopulated.
pub struct AttemptLedger {
    state: RwLock<LedgerState>,
}

impl AttemptLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Record a successful attempt: reset the failure counters for the user
    /// and the address to zero, and shift the user's last-login pair (the
    /// new success becomes current, the former current becomes previous).
    pub fn record_success(&self, attempt: &LoginAttempt) {
        debug_assert!(attempt.succeeded);
        self.write().apply(attempt);
    }

    /// Record a failed attempt: increment the address counter, and the user
    /// counter too when a user id resolved. A failure with no resolved user
    /// id never touches a user counter.
    pub fn record_failure(&self, attempt: &LoginAttempt) {
        debug_assert!(!attempt.succeeded);
        self.write().apply(attempt);
    }

    /// Consecutive failures for a user since their last success; 0 for a
    /// user never seen.
    pub fn failure_count_for_user(&self, id: UserId) -> u32 {
        self.read().failures_by_user.get(&id).copied().unwrap_or(0)
    }

    /// Consecutive failures for an address since its last success; 0 for an
    /// address never seen.
    pub fn failure_count_for_ip(&self, ip: &str) -> u32 {
        self.read().failures_by_ip.get(ip).copied().unwrap_or(0)
    }

    /// The user's most recent successful login, if any.
    pub fn last_login(&self, id: UserId) -> Option<LoginAttempt> {
        self.read().last_login.get(&id).cloned()
    }

    /// The user's second-most-recent successful login, if any.
    pub fn previous_login(&self, id: UserId) -> Option<LoginAttempt> {
        self.read().previous_login.get(&id).cloned()
    }

    /// Discard all derived state and replay the entire log, oldest to
    /// newest.
    ///
    /// The log scan runs first; the write lock is then held across the whole
    /// replay, so readers see either the old state or the fully rebuilt one.
    /// A scan fault leaves the previous state intact.
    ///
    /// # Returns
    ///
    /// The number of log records replayed.
    pub async fn rebuild_from_log<R: AttemptLogRepository>(&self, repo: &R) -> Result<usize, Error> {
        let records = repo.all_in_order().await?;

        let mut state = self.write();
        *state = LedgerState::default();
        for record in &records {
            state.apply(record);
        }
        tracing::debug!(records = records.len(), "Rebuilt attempt ledger from log");
        Ok(records.len())
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AttemptLedger {
    fn default() -> Self {
        Self::new()
    }
}
