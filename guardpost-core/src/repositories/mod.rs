//! Repository traits for the persistent store.
//!
//! The core treats the persistent store as exactly two things: a user table
//! it can scan in bulk and an append-only log of login attempts. These
//! traits are the whole storage contract; backends implement them and the
//! core never sees a schema or a connection.

pub mod attempt_log;
pub mod user;

pub use attempt_log::AttemptLogRepository;
pub use user::UserRepository;
