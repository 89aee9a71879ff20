//! Service layer for the login guard.
//!
//! This module contains the guard decision engine, which every login attempt
//! passes through, and the audit reporter, which recomputes ban/lock sets
//! straight from the persistent log.

pub mod audit;
pub mod guard;

pub use audit::{AuditReport, AuditReporter};
pub use guard::{GuardService, remote_address};
