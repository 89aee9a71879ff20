//! Audit reporting: ban and lock sets recomputed straight from the log.
//!
//! These queries intentionally ignore the live [`AttemptLedger`]: they are
//! advisory reporting, not login gating, and may disagree with the ledger if
//! it was never rebuilt after an out-of-band change to the log.
//!
//! [`AttemptLedger`]: crate::AttemptLedger

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{GuardConfig, LoginAttempt, UserId, repositories::AttemptLogRepository};

/// The report shape handed to external reporting consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub banned_ips: Vec<String>,
    pub locked_users: Vec<String>,
}

/// Per-key tallies folded over the log in sequence order.
///
/// Tracking the streak since the latest success while scanning forward
/// yields the same result as the two-pass formulation (never-succeeded keys
/// over the threshold, plus keys whose run after their latest success is
/// over the threshold) in a single walk.
#[derive(Default)]
struct StreakStats {
    total: u32,
    since_last_success: u32,
    ever_succeeded: bool,
}

impl StreakStats {
    fn observe(&mut self, succeeded: bool) {
        self.total += 1;
        if succeeded {
            self.ever_succeeded = true;
            self.since_last_success = 0;
        } else {
            self.since_last_success += 1;
        }
    }

    fn qualifies(&self, threshold: u32) -> bool {
        if self.ever_succeeded {
            // Pass two: a key can build a fresh streak after a success that
            // a whole-history aggregate would hide.
            self.since_last_success >= threshold
        } else {
            self.total >= threshold
        }
    }
}

/// Recomputes the banned-address and locked-user sets on demand.
///
/// Every call scans the log fresh; nothing is cached and the live ledger is
/// never consulted.
pub struct AuditReporter<L: AttemptLogRepository> {
    log: Arc<L>,
    config: GuardConfig,
}

impl<L: AttemptLogRepository> AuditReporter<L> {
    pub fn new(log: Arc<L>, config: GuardConfig) -> Self {
        Self { log, config }
    }

    /// Addresses whose failure streak qualifies them as banned.
    ///
    /// A query fault yields an empty list; the report is advisory and never
    /// propagates storage errors.
    pub async fn banned_addresses(&self) -> Vec<String> {
        let records = match self.log.all_in_order().await {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!(error = %error, "Audit query failed, reporting no banned addresses");
                return Vec::new();
            }
        };
        Self::banned_from(&records, self.config.ip_ban_threshold)
    }

    /// Login names of users whose failure streak qualifies them as locked.
    ///
    /// Attempts that never resolved to an account are excluded; an unknown
    /// login name cannot lock anything.
    pub async fn locked_users(&self) -> Vec<String> {
        let records = match self.log.all_in_order().await {
            Ok(records) => records,
            Err(error) => {
                tracing::warn!(error = %error, "Audit query failed, reporting no locked users");
                return Vec::new();
            }
        };
        Self::locked_from(&records, self.config.user_lock_threshold)
    }

    /// Both audit sets bundled for external reporting.
    pub async fn report(&self) -> AuditReport {
        AuditReport {
            banned_ips: self.banned_addresses().await,
            locked_users: self.locked_users().await,
        }
    }

    fn banned_from(records: &[LoginAttempt], threshold: u32) -> Vec<String> {
        let mut by_ip: HashMap<&str, StreakStats> = HashMap::new();
        for record in records {
            by_ip.entry(&record.ip).or_default().observe(record.succeeded);
        }

        let mut ips: Vec<String> = by_ip
            .into_iter()
            .filter(|(_, stats)| stats.qualifies(threshold))
            .map(|(ip, _)| ip.to_string())
            .collect();
        ips.sort();
        ips
    }

    fn locked_from(records: &[LoginAttempt], threshold: u32) -> Vec<String> {
        let mut by_user: HashMap<UserId, (StreakStats, &str)> = HashMap::new();
        for record in records {
            let Some(user_id) = record.user_id else {
                continue;
            };
            let entry = by_user
                .entry(user_id)
                .or_insert_with(|| (StreakStats::default(), ""));
            entry.0.observe(record.succeeded);
            // Report the name as last submitted for this account.
            entry.1 = record.login.as_str();
        }

        let mut logins: Vec<String> = by_user
            .into_values()
            .filter(|(stats, _)| stats.qualifies(threshold))
            .map(|(_, login)| login.to_string())
            .collect();
        logins.sort();
        logins
    }
}
