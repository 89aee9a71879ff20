//! SQLite implementations of the core repository traits.

pub mod attempt_log;
pub mod user;

pub use attempt_log::SqliteAttemptLogRepository;
pub use user::SqliteUserRepository;
