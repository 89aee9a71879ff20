//! Process-wide guard thresholds.

use std::env;

use crate::error::{ConfigError, Error};

pub const DEFAULT_USER_LOCK_THRESHOLD: u32 = 3;
pub const DEFAULT_IP_BAN_THRESHOLD: u32 = 10;

const USER_LOCK_THRESHOLD_ENV: &str = "GUARDPOST_USER_LOCK_THRESHOLD";
const IP_BAN_THRESHOLD_ENV: &str = "GUARDPOST_IP_BAN_THRESHOLD";

/// Thresholds for the lock and ban decisions.
///
/// Set once at startup and never mutated afterwards. Both thresholds bound a
/// *consecutive* failure streak since the key's last success, not an
/// all-time failure count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    /// Consecutive failures per user before the account is locked.
    pub user_lock_threshold: u32,

    /// Consecutive failures per address before the address is banned.
    pub ip_ban_threshold: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            user_lock_threshold: DEFAULT_USER_LOCK_THRESHOLD,
            ip_ban_threshold: DEFAULT_IP_BAN_THRESHOLD,
        }
    }
}

impl GuardConfig {
    pub fn new(user_lock_threshold: u32, ip_ban_threshold: u32) -> Self {
        Self {
            user_lock_threshold,
            ip_ban_threshold,
        }
    }

    /// Read thresholds from `GUARDPOST_USER_LOCK_THRESHOLD` and
    /// `GUARDPOST_IP_BAN_THRESHOLD`, falling back to the defaults when a
    /// variable is unset.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            user_lock_threshold: read_threshold(
                USER_LOCK_THRESHOLD_ENV,
                env::var(USER_LOCK_THRESHOLD_ENV).ok(),
                DEFAULT_USER_LOCK_THRESHOLD,
            )?,
            ip_ban_threshold: read_threshold(
                IP_BAN_THRESHOLD_ENV,
                env::var(IP_BAN_THRESHOLD_ENV).ok(),
                DEFAULT_IP_BAN_THRESHOLD,
            )?,
        })
    }
}

fn read_threshold(name: &str, value: Option<String>, default: u32) -> Result<u32, Error> {
    match value {
        Some(value) => value.parse().map_err(|_| {
            Error::Config(ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            })
        }),
        None => Ok(default),
    }
}
