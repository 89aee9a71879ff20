//! Password hashing for the credential check.
//!
//! The user table stores hex-encoded SHA-256 digests of `password:salt`,
//! with a per-account salt. The guard only ever recomputes and compares the
//! digest; populating the table is an account-management concern outside
//! this crate.
//!
//! Comparison against the stored hash is constant-time to avoid leaking
//! where the first differing byte sits.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash a submitted password with the account's salt.
///
/// # Returns
///
/// A hex-encoded SHA-256 digest of `"{password}:{salt}"`.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(b":");
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a submitted password against a stored hash.
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    let computed = hash_password(password, salt);
    constant_time_compare(computed.as_bytes(), stored_hash.as_bytes())
}

/// Constant-time comparison of two byte slices.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
