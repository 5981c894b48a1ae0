//! Lifecycle state of end-to-end encryption in one session.

use {
    krypta_crypto::{KeyMode, RsaKey, import_key_from_pem},
    krypta_protocol::LoginKeys,
};

use crate::error::KeyError;

/// Status exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionStatus {
    /// No key pair has ever been created for this login.
    Inactive,
    /// Keys exist server-side but the private key is not decrypted here.
    Locked,
    /// The private key is decrypted and held in memory.
    Unlocked,
}

impl std::fmt::Display for EncryptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Locked => write!(f, "locked"),
            Self::Unlocked => write!(f, "unlocked"),
        }
    }
}

/// Decrypted key pair held while unlocked.
#[derive(Debug, Clone)]
pub struct UnlockedKeys {
    /// Imported non-exportable.
    pub private_key: RsaKey,
    pub public_key: RsaKey,
}

impl UnlockedKeys {
    /// Import both halves from their PEM forms.
    pub fn from_pem(private_pem: &str, public_pem: &str) -> Result<Self, KeyError> {
        Ok(Self {
            private_key: import_key_from_pem(private_pem, KeyMode::Private, false)?,
            public_key: import_key_from_pem(public_pem, KeyMode::Public, true)?,
        })
    }
}

/// Tagged lifecycle state; each variant carries exactly what it needs.
#[derive(Debug, Clone, Default)]
pub enum EncryptionState {
    #[default]
    Inactive,
    Locked {
        blobs: LoginKeys,
    },
    Unlocked {
        keys: UnlockedKeys,
        blobs: LoginKeys,
    },
}

impl EncryptionState {
    pub fn status(&self) -> EncryptionStatus {
        match self {
            Self::Inactive => EncryptionStatus::Inactive,
            Self::Locked { .. } => EncryptionStatus::Locked,
            Self::Unlocked { .. } => EncryptionStatus::Unlocked,
        }
    }

    /// Stored blobs, unless inactive.
    pub fn blobs(&self) -> Option<&LoginKeys> {
        match self {
            Self::Inactive => None,
            Self::Locked { blobs } | Self::Unlocked { blobs, .. } => Some(blobs),
        }
    }

    pub fn keys(&self) -> Option<&UnlockedKeys> {
        match self {
            Self::Unlocked { keys, .. } => Some(keys),
            _ => None,
        }
    }

    /// Error for an operation that needs `expected` but found this state.
    pub(crate) fn mismatch(&self, expected: &'static str) -> KeyError {
        KeyError::InvalidState {
            expected,
            actual: self.status(),
        }
    }
}
