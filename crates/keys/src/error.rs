//! Error types for transport, local storage and the key lifecycle.

use {krypta_crypto::CryptoError, krypta_protocol::ErrorShape};

use crate::{
    policy::{self, Violation},
    state::EncryptionStatus,
};

/// Errors talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The backend rejected the transaction; nothing was applied.
    #[error("backend rejected request: {0}")]
    Server(ErrorShape),

    /// The connection was closed before a response arrived.
    #[error("connection closed")]
    Closed,

    /// The response did not match the request (count, transaction number).
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

/// Errors from the local session store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a failure should be surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Show a dialog, keep the current state, let the user retry.
    Recoverable,
    /// Inline form feedback; the action stays disabled.
    Validation,
    /// Should not happen; route to the generic error handler.
    Unexpected,
}

/// Errors produced by key lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// Another lifecycle operation is still running.
    #[error("another key operation is in progress")]
    Busy,

    /// The operation is not valid in the current lifecycle state.
    #[error("encryption must be {expected} for this operation, but it is {actual}")]
    InvalidState {
        expected: &'static str,
        actual: EncryptionStatus,
    },

    /// The session holds no login key (restored without `loginKeyAes`).
    #[error("no login key in this session; log in with your password first")]
    NoLoginKey,

    /// No session could be restored from local storage.
    #[error("not logged in")]
    NotLoggedIn,

    /// Key storage was attempted before both confirmations were given.
    #[error("confirm that the backup code is saved and that encryption is now active")]
    ConfirmationRequired,

    /// Recovery failed. Does not say which factor was wrong.
    #[error("unlock failed")]
    UnlockFailed,

    /// The current password did not decrypt the private key.
    #[error("current password is incorrect")]
    WrongPassword,

    #[error("new passwords do not match")]
    PasswordMismatch,

    #[error("password does not meet policy: {}", policy::join(.0))]
    PolicyViolation(Vec<Violation>),

    /// Configured RSA modulus is too small for sealing a field key.
    #[error("RSA modulus of {bits} bits is below the minimum of {min}")]
    WeakModulus { bits: u32, min: u32 },

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl KeyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Busy
            | Self::InvalidState { .. }
            | Self::NoLoginKey
            | Self::NotLoggedIn
            | Self::ConfirmationRequired
            | Self::UnlockFailed
            | Self::WrongPassword
            | Self::Transport(TransportError::Server(_)) => ErrorKind::Recoverable,
            Self::PasswordMismatch | Self::PolicyViolation(_) | Self::WeakModulus { .. } => {
                ErrorKind::Validation
            },
            Self::Crypto(_) | Self::Transport(_) | Self::Store(_) | Self::Join(_) => {
                ErrorKind::Unexpected
            },
        }
    }
}
