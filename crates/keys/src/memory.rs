//! In-memory reference backend.
//!
//! Implements the subset of the backend API this crate talks to, with the
//! same transaction semantics: every request in a transaction is applied to
//! a scratch copy, which only replaces the live state when all succeed.
//! Used by tests and for offline experimentation.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, RwLock},
};

use {
    async_trait::async_trait,
    krypta_protocol::{
        Action, AuthUser, AuthUserResponse, ErrorShape, LoginKeys, LoginKeysGet,
        LoginKeysGetResponse, LoginKeysReset, LoginKeysStore, LoginKeysStorePrivate, LookupGet,
        PASSWORD_SETTINGS, PasswordSet, PasswordSettings, Request, error_codes,
    },
    serde::{Serialize, de::DeserializeOwned},
    serde_json::Value,
    tracing::debug,
};

use crate::{backup::CHARSET, error::TransportError, policy, transport::Transport};

const TOKEN_LEN: usize = 40;
const SALT_LEN: usize = 32;

#[derive(Debug, Clone)]
struct User {
    password: String,
    salt_kdf: String,
    keys: Option<LoginKeys>,
}

#[derive(Debug, Clone, Default)]
struct State {
    users: HashMap<String, User>,
    /// token -> username
    tokens: HashMap<String, String>,
}

#[derive(Default)]
struct Shared {
    state: State,
    settings: PasswordSettings,
    /// `resource.action` names of every committed transaction.
    log: Vec<Vec<String>>,
    reject_next: Option<ErrorShape>,
}

/// Shared backend; clone it to hand out more connections to the same data.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with a custom password policy.
    pub fn with_password_settings(settings: PasswordSettings) -> Self {
        let backend = Self::default();
        backend.lock().settings = settings;
        backend
    }

    /// Register a login.
    pub fn add_user(&self, username: &str, password: &str) -> Result<(), TransportError> {
        let salt_kdf = random(SALT_LEN)?;
        self.lock().state.users.insert(username.to_string(), User {
            password: password.to_string(),
            salt_kdf,
            keys: None,
        });
        Ok(())
    }

    /// Open a new connection. Each connection carries its own token.
    pub fn connect(&self) -> MemoryTransport {
        MemoryTransport {
            backend: self.clone(),
            token: RwLock::new(None),
        }
    }

    /// Stored key material for `username`.
    pub fn login_keys(&self, username: &str) -> Option<LoginKeys> {
        self.lock()
            .state
            .users
            .get(username)
            .and_then(|u| u.keys.clone())
    }

    /// Current password for `username`.
    pub fn password(&self, username: &str) -> Option<String> {
        self.lock()
            .state
            .users
            .get(username)
            .map(|u| u.password.clone())
    }

    /// Administrative password reset: the stored keys are left untouched, so
    /// `privateKeyEnc` no longer matches the new password.
    pub fn set_password(&self, username: &str, password: &str) {
        if let Some(user) = self.lock().state.users.get_mut(username) {
            user.password = password.to_string();
        }
    }

    /// Committed transactions, oldest first.
    pub fn transactions(&self) -> Vec<Vec<String>> {
        self.lock().log.clone()
    }

    /// Fail the next transaction with `error`, applying nothing.
    pub fn reject_next(&self, error: ErrorShape) {
        self.lock().reject_next = Some(error);
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn execute(&self, token: Option<&str>, requests: &[Request]) -> Result<Vec<Value>, ErrorShape> {
        let mut shared = self.lock();
        if let Some(error) = shared.reject_next.take() {
            return Err(error);
        }

        let mut scratch = shared.state.clone();
        let mut payloads = Vec::with_capacity(requests.len());
        for request in requests {
            payloads.push(apply(&mut scratch, &shared.settings, token, request)?);
        }

        shared.state = scratch;
        shared.log.push(
            requests
                .iter()
                .map(|r| format!("{}.{}", r.resource, r.action))
                .collect(),
        );
        Ok(payloads)
    }
}

/// A connection to a [`MemoryBackend`].
pub struct MemoryTransport {
    backend: MemoryBackend,
    token: RwLock<Option<String>>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_multiple(&self, requests: Vec<Request>) -> Result<Vec<Value>, TransportError> {
        let token = self.token.read().unwrap_or_else(|e| e.into_inner()).clone();
        match self.backend.execute(token.as_deref(), &requests) {
            Ok(payloads) => Ok(payloads),
            Err(error) => {
                debug!(code = %error.code, "memory backend rejected transaction");
                Err(TransportError::Server(error))
            },
        }
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }
}

fn apply(
    state: &mut State,
    settings: &PasswordSettings,
    token: Option<&str>,
    request: &Request,
) -> Result<Value, ErrorShape> {
    if request.is::<AuthUser>() {
        let AuthUser { username, password } = parse(request)?;
        let salt_kdf = match state.users.get(&username) {
            Some(user) if user.password == password => user.salt_kdf.clone(),
            _ => return Err(unauthorized("invalid username or password")),
        };
        let issued = random(TOKEN_LEN)
            .map_err(|e| ErrorShape::new(error_codes::UNAVAILABLE, e.to_string()))?;
        state.tokens.insert(issued.clone(), username);
        return to_payload(&AuthUserResponse {
            token: issued,
            salt_kdf,
        });
    }

    if request.is::<LookupGet>() {
        let LookupGet { name } = parse(request)?;
        if name != PASSWORD_SETTINGS {
            return Err(ErrorShape::new(
                error_codes::NOT_FOUND,
                format!("unknown lookup {name}"),
            ));
        }
        return to_payload(settings);
    }

    let username = token
        .and_then(|t| state.tokens.get(t))
        .cloned()
        .ok_or_else(|| unauthorized("missing or unknown token"))?;
    let user = state
        .users
        .get_mut(&username)
        .ok_or_else(|| unauthorized("login no longer exists"))?;

    if request.is::<LoginKeysGet>() {
        let keys = user.keys.clone();
        return to_payload(&LoginKeysGetResponse {
            private_key_enc: keys.as_ref().map(|k| k.private_key_enc.clone()),
            private_key_enc_backup: keys.as_ref().map(|k| k.private_key_enc_backup.clone()),
            public_key: keys.map(|k| k.public_key),
        });
    }

    if request.is::<LoginKeysStore>() {
        let LoginKeysStore(keys) = parse(request)?;
        if user.keys.is_some() {
            return Err(invalid("keys already stored; reset first"));
        }
        user.keys = Some(keys);
        return Ok(ack());
    }

    if request.is::<LoginKeysStorePrivate>() {
        let LoginKeysStorePrivate { private_key_enc } = parse(request)?;
        let keys = user.keys.as_mut().ok_or_else(|| {
            ErrorShape::new(error_codes::NOT_FOUND, "no keys stored for this login")
        })?;
        keys.private_key_enc = private_key_enc;
        return Ok(ack());
    }

    if request.is::<LoginKeysReset>() {
        user.keys = None;
        return Ok(ack());
    }

    if request.is::<PasswordSet>() {
        let PasswordSet {
            pw_old,
            pw_new0,
            pw_new1,
        } = parse(request)?;
        if pw_old != user.password {
            return Err(invalid("current password is incorrect"));
        }
        if pw_new0 != pw_new1 {
            return Err(invalid("new passwords do not match"));
        }
        let violations = policy::validate(settings, &pw_new0);
        if !violations.is_empty() {
            let list: Vec<String> = violations.iter().map(ToString::to_string).collect();
            return Err(ErrorShape::new(
                error_codes::POLICY_VIOLATION,
                format!("password needs {}", list.join(", ")),
            ));
        }
        user.password = pw_new0;
        return Ok(ack());
    }

    Err(invalid(format!(
        "unknown action {}.{}",
        request.resource, request.action
    )))
}

fn parse<A: Action + DeserializeOwned>(request: &Request) -> Result<A, ErrorShape> {
    request.parse::<A>().map_err(|e| invalid(e.to_string()))
}

fn to_payload<S: Serialize + ?Sized>(value: &S) -> Result<Value, ErrorShape> {
    serde_json::to_value(value).map_err(|e| invalid(e.to_string()))
}

fn ack() -> Value {
    Value::Object(serde_json::Map::new())
}

fn invalid(message: impl Into<String>) -> ErrorShape {
    ErrorShape::new(error_codes::INVALID_REQUEST, message)
}

fn unauthorized(message: &str) -> ErrorShape {
    ErrorShape::new(error_codes::UNAUTHORIZED, message)
}

fn random(len: usize) -> Result<String, TransportError> {
    krypta_crypto::random_string(len, CHARSET)
        .map_err(|e| TransportError::Protocol(format!("random generation failed: {e}")))
}
