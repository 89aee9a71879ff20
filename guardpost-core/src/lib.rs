//! Core functionality for the guardpost login guard.
//!
//! Guardpost tracks login attempts, derives per-user and per-address failure
//! streaks, and decides whether an account is locked or an address banned.
//! The persistent store is treated as two things only: a user table that can
//! be scanned in bulk and an append-only log of login attempts; everything
//! in memory is a derived view of that log.
//!
//! The pieces:
//!
//! - [`IdentityStore`]: in-memory snapshot of the user table.
//! - [`AttemptLedger`]: consecutive-failure counters and last-login pairs,
//!   updated on every attempt and rebuildable in full from the log.
//! - [`services::GuardService`]: the decision engine behind every login try.
//! - [`services::AuditReporter`]: ban/lock sets recomputed straight from the
//!   log, independent of the live ledger.
//!
//! Storage backends implement the traits in [`repositories`].

pub mod attempt;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod repositories;
pub mod services;
pub mod user;

pub use attempt::{LoginAttempt, NewLoginAttempt};
pub use config::GuardConfig;
pub use error::{AuthError, Error, StorageError};
pub use identity::IdentityStore;
pub use ledger::AttemptLedger;
pub use user::{User, UserId};
