//! The guard decision engine: the single entry point for a login attempt.

use std::sync::Arc;

use crate::{
    AttemptLedger, Error, GuardConfig, IdentityStore, LoginAttempt, NewLoginAttempt, User, UserId,
    crypto,
    error::AuthError,
    repositories::{AttemptLogRepository, UserRepository},
};

/// Resolve the client address for the ban decision.
///
/// Prefers a forwarded-address header value over the transport peer address,
/// so the guard keys on the real client when deployed behind a reverse
/// proxy. Only the first hop of a comma-separated header is used.
pub fn remote_address<'a>(forwarded_for: Option<&'a str>, peer_addr: &'a str) -> &'a str {
    match forwarded_for {
        Some(header) => match header.split(',').next().map(str::trim) {
            Some(first) if !first.is_empty() => first,
            _ => peer_addr,
        },
        None => peer_addr,
    }
}

/// Coordinates the identity snapshot, the attempt ledger, and the persistent
/// log for every login attempt.
///
/// # Thread Safety
///
/// The service is shared across request handlers. The stores it owns handle
/// their own mutual exclusion; no lock is held across storage I/O except
/// during a full rebuild, where that is the point.
pub struct GuardService<U: UserRepository, L: AttemptLogRepository> {
    users: Arc<U>,
    log: Arc<L>,
    identity: IdentityStore,
    ledger: AttemptLedger,
    config: GuardConfig,
}

impl<U: UserRepository, L: AttemptLogRepository> GuardService<U, L> {
    pub fn new(users: Arc<U>, log: Arc<L>, config: GuardConfig) -> Self {
        Self {
            users,
            log,
            identity: IdentityStore::new(),
            ledger: AttemptLedger::new(),
            config,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Full cold rebuild of the identity snapshot and the attempt ledger
    /// from the persistent store.
    ///
    /// Intended for process start and for the administrative
    /// re-initialization path. A storage fault is fatal to the rebuild and
    /// propagates, leaving the previous in-memory state intact; a rebuild
    /// never commits a half-populated snapshot.
    pub async fn rebuild_all(&self) -> Result<(), Error> {
        let users = self.identity.load_all(self.users.as_ref()).await?;
        let records = self.ledger.rebuild_from_log(self.log.as_ref()).await?;
        tracing::info!(users, records, "Rebuilt identity store and attempt ledger");
        Ok(())
    }

    /// Decide one login attempt.
    ///
    /// Checks run in a fixed order: address ban, account lock, account
    /// existence, credential. The ban check runs even when the login name
    /// did not resolve and takes precedence over everything else; the fixed
    /// order keeps a rate-limited caller from telling "wrong password" apart
    /// from "unknown login".
    ///
    /// The threshold comparisons read the counters as they stood *before*
    /// this attempt, so the attempt whose failure reaches a threshold is
    /// itself still admitted through the credential check; the rejection
    /// starts with the next one.
    ///
    /// Regardless of outcome, exactly one record is appended to the log and
    /// folded into the ledger before this method returns.
    pub async fn attempt(
        &self,
        login_name: &str,
        password: &str,
        remote_addr: &str,
    ) -> Result<User, Error> {
        let user = self.identity.by_login(login_name);
        let outcome = self.decide(user.as_ref(), password, remote_addr);

        self.record_attempt(user.as_ref(), login_name, remote_addr, outcome.is_ok())
            .await;

        outcome.map_err(Error::from)
    }

    fn decide(
        &self,
        user: Option<&User>,
        password: &str,
        remote_addr: &str,
    ) -> Result<User, AuthError> {
        if self.ledger.failure_count_for_ip(remote_addr) >= self.config.ip_ban_threshold {
            return Err(AuthError::BannedAddress);
        }

        if let Some(user) = user
            && self.ledger.failure_count_for_user(user.id) >= self.config.user_lock_threshold
        {
            return Err(AuthError::LockedAccount);
        }

        let Some(user) = user else {
            return Err(AuthError::UserNotFound);
        };

        if !crypto::verify_password(password, &user.salt, &user.password_hash) {
            return Err(AuthError::WrongPassword);
        }

        Ok(user.clone())
    }

    /// Append the attempt to the persistent log and fold it into the ledger,
    /// on every exit path of [`GuardService::attempt`].
    ///
    /// A failed append is logged and swallowed: the decision already made
    /// stands, and the ledger is updated anyway. This favors availability of
    /// the login path over strict log completeness and is a known
    /// consistency gap between the ledger and the log.
    async fn record_attempt(
        &self,
        user: Option<&User>,
        login_name: &str,
        remote_addr: &str,
        succeeded: bool,
    ) {
        let attempt = NewLoginAttempt::new(user.map(|u| u.id), login_name, remote_addr, succeeded);

        let record = match self.log.append(attempt.clone()).await {
            Ok(record) => record,
            Err(error) => {
                tracing::error!(
                    error = %error,
                    login = login_name,
                    ip = remote_addr,
                    "Failed to append login attempt to the persistent log"
                );
                attempt.into_record(0)
            }
        };

        if succeeded {
            self.ledger.record_success(&record);
        } else {
            self.ledger.record_failure(&record);
        }
    }

    /// Look up an account by id in the current snapshot.
    pub fn user_by_id(&self, id: UserId) -> Option<User> {
        self.identity.by_id(id)
    }

    /// Look up an account by login name in the current snapshot.
    pub fn user_by_login(&self, login: &str) -> Option<User> {
        self.identity.by_login(login)
    }

    /// Current consecutive-failure count for a user.
    pub fn failure_count_for_user(&self, id: UserId) -> u32 {
        self.ledger.failure_count_for_user(id)
    }

    /// Current consecutive-failure count for an address.
    pub fn failure_count_for_ip(&self, ip: &str) -> u32 {
        self.ledger.failure_count_for_ip(ip)
    }

    /// The user's most recent successful login.
    pub fn last_login(&self, id: UserId) -> Option<LoginAttempt> {
        self.ledger.last_login(id)
    }

    /// The user's second-most-recent successful login.
    pub fn previous_login(&self, id: UserId) -> Option<LoginAttempt> {
        self.ledger.previous_login(id)
    }

    /// The record to show a freshly signed-in user: the session before the
    /// one just established, falling back to the current one for a user's
    /// first success.
    pub fn previous_or_last(&self, id: UserId) -> Option<LoginAttempt> {
        self.ledger.previous_login(id).or_else(|| self.ledger.last_login(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::error::StorageError;

    struct MockUserRepository {
        users: Vec<User>,
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn all(&self) -> Result<Vec<User>, Error> {
            Ok(self.users.clone())
        }
    }

    struct MockAttemptLog {
        records: Mutex<Vec<LoginAttempt>>,
        fail_appends: Mutex<bool>,
    }

    impl MockAttemptLog {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail_appends: Mutex::new(false),
            }
        }
    }

    #[async_trait]
    impl AttemptLogRepository for MockAttemptLog {
        async fn append(&self, attempt: NewLoginAttempt) -> Result<LoginAttempt, Error> {
            if *self.fail_appends.lock().unwrap() {
                return Err(StorageError::Database("log unavailable".into()).into());
            }
            let mut records = self.records.lock().unwrap();
            let record = attempt.into_record(records.len() as i64 + 1);
            records.push(record.clone());
            Ok(record)
        }

        async fn all_in_order(&self) -> Result<Vec<LoginAttempt>, Error> {
            Ok(self.records.lock().unwrap().clone())
        }
    }

    fn test_user(id: i64, login: &str, password: &str) -> User {
        let salt = format!("{login}-salt");
        User {
            id: UserId::new(id),
            login: login.to_string(),
            password_hash: crypto::hash_password(password, &salt),
            salt,
        }
    }

    async fn service(users: Vec<User>, config: GuardConfig) -> GuardService<MockUserRepository, MockAttemptLog> {
        let service = GuardService::new(
            Arc::new(MockUserRepository { users }),
            Arc::new(MockAttemptLog::new()),
            config,
        );
        service.rebuild_all().await.unwrap();
        service
    }

    fn assert_rejected(outcome: Result<User, Error>, expected: AuthError) {
        match outcome {
            Err(error) => {
                assert!(error.is_rejection());
                match error {
                    Error::Auth(e) => assert_eq!(e, expected),
                    other => panic!("expected {expected:?}, got {other:?}"),
                }
            }
            Ok(user) => panic!("expected {expected:?}, got user {user:?}"),
        }
    }

    #[tokio::test]
    async fn test_successful_login() {
        let service = service(vec![test_user(1, "alice", "pw")], GuardConfig::default()).await;

        let user = service.attempt("alice", "pw", "10.0.0.1").await.unwrap();
        assert_eq!(user.id, UserId::new(1));

        let records = service.log.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].succeeded);
        assert_eq!(records[0].user_id, Some(UserId::new(1)));
    }

    #[tokio::test]
    async fn test_wrong_password_recorded_as_failure() {
        let service = service(vec![test_user(1, "alice", "pw")], GuardConfig::default()).await;

        assert_rejected(
            service.attempt("alice", "nope", "10.0.0.1").await,
            AuthError::WrongPassword,
        );

        assert_eq!(service.failure_count_for_user(UserId::new(1)), 1);
        assert_eq!(service.failure_count_for_ip("10.0.0.1"), 1);

        let records = service.log.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].succeeded);
    }

    #[tokio::test]
    async fn test_unknown_login_rejected_and_only_ip_counted() {
        let service = service(vec![test_user(1, "alice", "pw")], GuardConfig::default()).await;

        assert_rejected(
            service.attempt("ghost", "pw", "10.0.0.1").await,
            AuthError::UserNotFound,
        );

        assert_eq!(service.failure_count_for_ip("10.0.0.1"), 1);
        assert_eq!(service.failure_count_for_user(UserId::new(1)), 0);

        // The attempt still lands in the log, with no user id.
        let records = service.log.records.lock().unwrap();
        assert_eq!(records[0].user_id, None);
        assert_eq!(records[0].login, "ghost");
    }

    #[tokio::test]
    async fn test_lock_threshold_boundary() {
        let config = GuardConfig::new(3, 10);
        let service = service(vec![test_user(1, "alice", "pw")], config).await;

        // k < threshold failures still reach the credential check.
        for _ in 0..2 {
            assert_rejected(
                service.attempt("alice", "nope", "10.0.0.1").await,
                AuthError::WrongPassword,
            );
        }

        // The third failure reaches the threshold but is itself admitted
        // through the credential check.
        assert_rejected(
            service.attempt("alice", "nope", "10.0.0.1").await,
            AuthError::WrongPassword,
        );

        // From the next attempt on, the lock fires before the credential
        // check, even with the correct password.
        assert_rejected(
            service.attempt("alice", "pw", "10.0.0.1").await,
            AuthError::LockedAccount,
        );
        assert_eq!(service.failure_count_for_user(UserId::new(1)), 4);
    }

    #[tokio::test]
    async fn test_ban_threshold_boundary_and_precedence() {
        let config = GuardConfig::new(3, 5);
        let service = service(
            vec![test_user(1, "alice", "pw"), test_user(2, "carol", "pw")],
            config,
        )
        .await;

        // Probe different unknown names so only the address accumulates.
        for i in 0..5 {
            assert_rejected(
                service.attempt(&format!("ghost{i}"), "x", "10.0.0.1").await,
                AuthError::UserNotFound,
            );
        }
        assert_eq!(service.failure_count_for_ip("10.0.0.1"), 5);

        // The ban now fires first, known account or not, correct password
        // or not.
        assert_rejected(
            service.attempt("carol", "pw", "10.0.0.1").await,
            AuthError::BannedAddress,
        );
        assert_rejected(
            service.attempt("ghost", "x", "10.0.0.1").await,
            AuthError::BannedAddress,
        );

        // Another address is unaffected.
        assert!(service.attempt("carol", "pw", "10.0.0.2").await.is_ok());
    }

    #[tokio::test]
    async fn test_success_resets_both_counters() {
        let service = service(vec![test_user(1, "alice", "pw")], GuardConfig::new(5, 10)).await;

        for _ in 0..3 {
            let _ = service.attempt("alice", "nope", "10.0.0.1").await;
        }
        assert_eq!(service.failure_count_for_user(UserId::new(1)), 3);

        service.attempt("alice", "pw", "10.0.0.1").await.unwrap();

        assert_eq!(service.failure_count_for_user(UserId::new(1)), 0);
        assert_eq!(service.failure_count_for_ip("10.0.0.1"), 0);
    }

    #[tokio::test]
    async fn test_lock_scenario_with_unknown_probe() {
        // alice locks at 3, then the same address keeps probing
        // as an unknown user and passes the lock check until the ban fires.
        let config = GuardConfig::new(3, 10);
        let service = service(vec![test_user(1, "alice", "pw")], config).await;

        for _ in 0..3 {
            let _ = service.attempt("alice", "nope", "10.0.0.1").await;
        }
        assert_rejected(
            service.attempt("alice", "pw", "10.0.0.1").await,
            AuthError::LockedAccount,
        );

        // Unknown name passes the lock check (no user matched) but keeps
        // feeding the address counter.
        for _ in 0..6 {
            assert_rejected(
                service.attempt("bob", "x", "10.0.0.1").await,
                AuthError::UserNotFound,
            );
        }
        assert_eq!(service.failure_count_for_ip("10.0.0.1"), 10);

        assert_rejected(
            service.attempt("bob", "x", "10.0.0.1").await,
            AuthError::BannedAddress,
        );
    }

    #[tokio::test]
    async fn test_last_and_previous_login_shift() {
        let service = service(vec![test_user(1, "alice", "pw")], GuardConfig::default()).await;
        let user = UserId::new(1);

        service.attempt("alice", "pw", "10.0.0.1").await.unwrap();
        let s1 = service.last_login(user).unwrap();
        assert!(service.previous_login(user).is_none());
        // First success: nothing earlier to show, fall back to the current one.
        assert_eq!(service.previous_or_last(user), Some(s1.clone()));

        service.attempt("alice", "pw", "10.0.0.2").await.unwrap();
        service.attempt("alice", "pw", "10.0.0.3").await.unwrap();

        let last = service.last_login(user).unwrap();
        let previous = service.previous_login(user).unwrap();
        assert_eq!(last.ip, "10.0.0.3");
        assert_eq!(previous.ip, "10.0.0.2");
        assert_eq!(service.previous_or_last(user), Some(previous));
    }

    #[tokio::test]
    async fn test_append_failure_keeps_decision_and_updates_ledger() {
        let service = service(vec![test_user(1, "alice", "pw")], GuardConfig::default()).await;

        *service.log.fail_appends.lock().unwrap() = true;

        assert_rejected(
            service.attempt("alice", "nope", "10.0.0.1").await,
            AuthError::WrongPassword,
        );
        let user = service.attempt("alice", "pw", "10.0.0.1").await.unwrap();
        assert_eq!(user.login, "alice");

        // The ledger tracked both attempts even though nothing was persisted.
        assert_eq!(service.failure_count_for_user(UserId::new(1)), 0);
        assert!(service.last_login(UserId::new(1)).is_some());
        assert!(service.log.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_all_restores_counters_from_log() {
        let users = vec![test_user(1, "alice", "pw")];
        let log = Arc::new(MockAttemptLog::new());
        let first = GuardService::new(
            Arc::new(MockUserRepository {
                users: users.clone(),
            }),
            log.clone(),
            GuardConfig::default(),
        );
        first.rebuild_all().await.unwrap();

        let _ = first.attempt("alice", "nope", "10.0.0.1").await;
        let _ = first.attempt("alice", "nope", "10.0.0.1").await;

        // A fresh process sharing the same log converges on the same state.
        let second = GuardService::new(
            Arc::new(MockUserRepository { users }),
            log,
            GuardConfig::default(),
        );
        second.rebuild_all().await.unwrap();

        assert_eq!(second.failure_count_for_user(UserId::new(1)), 2);
        assert_eq!(second.failure_count_for_ip("10.0.0.1"), 2);
    }

    #[test]
    fn test_remote_address_prefers_forwarded_header() {
        assert_eq!(remote_address(None, "192.0.2.1"), "192.0.2.1");
        assert_eq!(remote_address(Some("10.0.0.1"), "192.0.2.1"), "10.0.0.1");
        assert_eq!(
            remote_address(Some("10.0.0.1, 172.16.0.1"), "192.0.2.1"),
            "10.0.0.1"
        );
        assert_eq!(remote_address(Some(""), "192.0.2.1"), "192.0.2.1");
    }
}
