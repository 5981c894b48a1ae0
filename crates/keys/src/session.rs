//! Login session: token, KDF salt and the password-derived login key.

use {
    krypta_crypto::{AesKey, derive_key_from_password, export_aes_key_base64, import_aes_key_base64},
    krypta_protocol::AuthUser,
    tracing::{debug, info, warn},
    zeroize::Zeroizing,
};

use crate::{
    error::KeyError,
    store::{LOGIN_KEY_AES, LOGIN_KEY_SALT, LocalStore, TOKEN},
    transport::{Transport, call},
};

/// Authenticated session state.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    salt: String,
    login_key: Option<AesKey>,
    stay_logged_in: bool,
}

impl Session {
    /// Build a session directly (e.g. from an external login flow).
    pub fn new(
        token: impl Into<String>,
        salt: impl Into<String>,
        login_key: Option<AesKey>,
        stay_logged_in: bool,
    ) -> Self {
        Self {
            token: token.into(),
            salt: salt.into(),
            login_key,
            stay_logged_in,
        }
    }

    /// Log in with username and password, derive the login key and persist
    /// the session. The raw key is only written when `stay_logged_in`.
    pub async fn login<T: Transport + ?Sized>(
        transport: &T,
        store: &dyn LocalStore,
        username: &str,
        password: &str,
        stay_logged_in: bool,
        kdf_iterations: u32,
    ) -> Result<Self, KeyError> {
        let auth = call(transport, &AuthUser {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;
        transport.set_token(Some(auth.token.clone()));

        let login_key = derive_login_key(password, &auth.salt_kdf, kdf_iterations).await?;

        let session = Self {
            token: auth.token,
            salt: auth.salt_kdf,
            login_key: Some(login_key),
            stay_logged_in,
        };
        session.persist(store).await?;

        info!(username, stay_logged_in, "logged in");
        Ok(session)
    }

    /// Rebuild a session from the local store.
    ///
    /// Without a stored `loginKeyAes` the session has no login key, and an
    /// existing key pair will load as locked.
    pub async fn restore(store: &dyn LocalStore) -> Result<Self, KeyError> {
        let token = store.get(TOKEN).await?.ok_or(KeyError::NotLoggedIn)?;
        let salt = store.get(LOGIN_KEY_SALT).await?.ok_or(KeyError::NotLoggedIn)?;

        let login_key = match store.get(LOGIN_KEY_AES).await? {
            Some(encoded) => {
                let encoded = Zeroizing::new(encoded);
                match import_aes_key_base64(&encoded) {
                    Ok(key) => Some(key),
                    Err(e) => {
                        warn!(error = %e, "discarding unreadable stored login key");
                        store.remove(LOGIN_KEY_AES).await?;
                        None
                    },
                }
            },
            None => None,
        };

        debug!(has_login_key = login_key.is_some(), "restored session");
        Ok(Self {
            token,
            stay_logged_in: login_key.is_some(),
            salt,
            login_key,
        })
    }

    /// Forget in-memory keys. Stored values are removed unless the session
    /// was marked stay-logged-in.
    pub async fn logout(mut self, store: &dyn LocalStore) -> Result<(), KeyError> {
        self.login_key = None;
        if !self.stay_logged_in {
            store.remove(LOGIN_KEY_AES).await?;
            store.remove(TOKEN).await?;
        }
        info!(stay_logged_in = self.stay_logged_in, "logged out");
        Ok(())
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn login_key(&self) -> Option<&AesKey> {
        self.login_key.as_ref()
    }

    pub fn stay_logged_in(&self) -> bool {
        self.stay_logged_in
    }

    /// Replace the login key and re-persist it when stay-logged-in.
    pub(crate) async fn set_login_key(
        &mut self,
        key: AesKey,
        store: &dyn LocalStore,
    ) -> Result<(), KeyError> {
        self.login_key = Some(key);
        self.persist(store).await
    }

    async fn persist(&self, store: &dyn LocalStore) -> Result<(), KeyError> {
        store.set(TOKEN, &self.token).await?;
        store.set(LOGIN_KEY_SALT, &self.salt).await?;
        match (&self.login_key, self.stay_logged_in) {
            (Some(key), true) => {
                let encoded = Zeroizing::new(export_aes_key_base64(key));
                store.set(LOGIN_KEY_AES, &encoded).await?;
            },
            _ => store.remove(LOGIN_KEY_AES).await?,
        }
        Ok(())
    }
}

/// PBKDF2 off the async runtime.
pub(crate) async fn derive_login_key(
    password: &str,
    salt: &str,
    iterations: u32,
) -> Result<AesKey, KeyError> {
    let password = Zeroizing::new(password.to_string());
    let salt = salt.to_string();
    let key = tokio::task::spawn_blocking(move || {
        derive_key_from_password(&password, &salt, iterations)
    })
    .await??;
    Ok(key)
}
