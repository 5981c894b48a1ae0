//! Backend RPC protocol definitions.
//!
//! All communication uses JSON text frames over a single WebSocket. The client
//! sends a transaction (one or more requests); the backend answers with one
//! response per request, or a single error in which case nothing was applied.
//!
//! Frame types:
//! - `TransactionFrame`: client → backend batch of requests
//! - `ResponseFrame`: backend → client result for one transaction

use serde::{Deserialize, Serialize, de::DeserializeOwned};

// ── Constants ────────────────────────────────────────────────────────────────

pub const MAX_PAYLOAD_BYTES: usize = 524_288; // 512 KB

/// Name of the password policy lookup.
pub const PASSWORD_SETTINGS: &str = "passwordSettings";

pub mod resources {
    pub const AUTH: &str = "auth";
    pub const LOGIN_KEYS: &str = "loginKeys";
    pub const LOOKUP: &str = "lookup";
    pub const PASSWORD: &str = "password";
}

// ── Error codes ──────────────────────────────────────────────────────────────

pub mod error_codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const POLICY_VIOLATION: &str = "POLICY_VIOLATION";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
}

// ── Error shape ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
}

impl ErrorShape {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ErrorShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

// ── Frames ───────────────────────────────────────────────────────────────────

/// A single RPC call inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Request {
    /// Build a request from a typed [`Action`] payload.
    pub fn from_action<A: Action>(action: &A) -> serde_json::Result<Self> {
        Ok(Self {
            resource: A::RESOURCE.into(),
            action: A::ACTION.into(),
            payload: serde_json::to_value(action)?,
        })
    }

    /// `true` if this request targets `A`.
    pub fn is<A: Action>(&self) -> bool {
        self.resource == A::RESOURCE && self.action == A::ACTION
    }

    /// Deserialize the payload as `A`.
    pub fn parse<A: Action + DeserializeOwned>(&self) -> serde_json::Result<A> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Client → backend batch. Applied atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFrame {
    #[serde(rename = "transactionNr")]
    pub transaction_nr: u64,
    pub requests: Vec<Request>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Payload of one successful request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Backend → client result of a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFrame {
    #[serde(rename = "transactionNr")]
    pub transaction_nr: u64,
    #[serde(default)]
    pub responses: Vec<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}

impl ResponseFrame {
    pub fn ok(transaction_nr: u64, payloads: Vec<serde_json::Value>) -> Self {
        Self {
            transaction_nr,
            responses: payloads.into_iter().map(|payload| Response { payload }).collect(),
            error: None,
        }
    }

    pub fn err(transaction_nr: u64, error: ErrorShape) -> Self {
        Self {
            transaction_nr,
            responses: Vec::new(),
            error: Some(error),
        }
    }
}

// ── Typed actions ────────────────────────────────────────────────────────────

/// A typed request payload bound to its `resource.action` name and the shape
/// of its response payload.
pub trait Action: Serialize {
    const RESOURCE: &'static str;
    const ACTION: &'static str;
    type Response: DeserializeOwned;
}

/// Acknowledgement with no meaningful payload.
pub type Ack = serde::de::IgnoredAny;

/// `auth.user`: password login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub token: String,
    /// PBKDF2 salt for the login key (`loginKeySalt`).
    #[serde(rename = "saltKdf")]
    pub salt_kdf: String,
}

impl Action for AuthUser {
    const ACTION: &'static str = "user";
    const RESOURCE: &'static str = resources::AUTH;
    type Response = AuthUserResponse;
}

/// Encrypted key material as persisted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginKeys {
    /// Private key PEM under the password-derived login key.
    pub private_key_enc: String,
    /// Private key PEM under the backup code.
    pub private_key_enc_backup: String,
    /// Public key PEM, unencrypted.
    pub public_key: String,
}

/// `loginKeys.get`: fetch stored key material (all fields absent when
/// encryption was never set up).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginKeysGet {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginKeysGetResponse {
    #[serde(default)]
    pub private_key_enc: Option<String>,
    #[serde(default)]
    pub private_key_enc_backup: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
}

impl LoginKeysGetResponse {
    /// Collapse into [`LoginKeys`] when all three blobs are present.
    pub fn into_keys(self) -> Option<LoginKeys> {
        Some(LoginKeys {
            private_key_enc: self.private_key_enc?,
            private_key_enc_backup: self.private_key_enc_backup?,
            public_key: self.public_key?,
        })
    }
}

impl Action for LoginKeysGet {
    const ACTION: &'static str = "get";
    const RESOURCE: &'static str = resources::LOGIN_KEYS;
    type Response = LoginKeysGetResponse;
}

/// `loginKeys.store`: persist initial key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoginKeysStore(pub LoginKeys);

impl Action for LoginKeysStore {
    const ACTION: &'static str = "store";
    const RESOURCE: &'static str = resources::LOGIN_KEYS;
    type Response = Ack;
}

/// `loginKeys.storePrivate`: replace the password-encrypted private key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginKeysStorePrivate {
    pub private_key_enc: String,
}

impl Action for LoginKeysStorePrivate {
    const ACTION: &'static str = "storePrivate";
    const RESOURCE: &'static str = resources::LOGIN_KEYS;
    type Response = Ack;
}

/// `loginKeys.reset`: clear all key material for the login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginKeysReset {}

impl Action for LoginKeysReset {
    const ACTION: &'static str = "reset";
    const RESOURCE: &'static str = resources::LOGIN_KEYS;
    type Response = Ack;
}

/// `password.set`: change the login password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSet {
    pub pw_old: String,
    pub pw_new0: String,
    pub pw_new1: String,
}

impl Action for PasswordSet {
    const ACTION: &'static str = "set";
    const RESOURCE: &'static str = resources::PASSWORD;
    type Response = Ack;
}

/// `lookup.get`: named lookup (only `passwordSettings` is used here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupGet {
    pub name: String,
}

impl LookupGet {
    pub fn password_settings() -> Self {
        Self {
            name: PASSWORD_SETTINGS.into(),
        }
    }
}

impl Action for LookupGet {
    const ACTION: &'static str = "get";
    const RESOURCE: &'static str = resources::LOOKUP;
    type Response = PasswordSettings;
}

/// Password policy returned by the `passwordSettings` lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordSettings {
    pub length: usize,
    pub require_digits: bool,
    pub require_lower: bool,
    pub require_upper: bool,
    pub require_special: bool,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            length: 12,
            require_digits: false,
            require_lower: false,
            require_upper: false,
            require_special: false,
        }
    }
}
