//! User accounts as loaded from the persistent user table.

use serde::{Deserialize, Serialize};

/// A unique, stable identifier for a user account, assigned by the user table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        UserId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account record.
///
/// Immutable once loaded: account management happens through an external
/// path, and its changes become visible only after a full reload of the
/// [`IdentityStore`](crate::IdentityStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The unique identifier for the account.
    pub id: UserId,

    /// The login name, unique across accounts.
    pub login: String,

    /// Hex-encoded hash of the password and salt, see [`crate::crypto`].
    pub password_hash: String,

    /// The per-account salt fed into the password hash.
    pub salt: String,
}
