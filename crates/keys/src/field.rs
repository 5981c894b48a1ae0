//! Per-value envelope encryption for end-to-end protected fields.

use serde::{Deserialize, Serialize};

/// A value sealed for the current user.
///
/// `value_enc` is the value under a fresh AES-GCM data key; `key_enc` is that
/// data key wrapped with the user's RSA public key (base64).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedField {
    pub key_enc: String,
    pub value_enc: String,
}
