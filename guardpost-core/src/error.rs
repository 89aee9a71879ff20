use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Expected, user-facing outcomes of a login attempt. These are returned,
/// never raised as fatal conditions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Banned address")]
    BannedAddress,

    #[error("Locked account")]
    LockedAccount,

    #[error("User not found")]
    UserNotFound,

    #[error("Wrong password")]
    WrongPassword,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

impl Error {
    /// True for the expected rejection outcomes of a login attempt, as
    /// opposed to system faults.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}
