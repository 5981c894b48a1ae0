/// Config schema types (server, crypto, storage, auth).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Default PBKDF2 iteration count for the login key.
pub const DEFAULT_KDF_ITERATIONS: u32 = 210_000;

/// Default RSA modulus length for new key pairs.
pub const DEFAULT_RSA_MODULUS_BITS: u32 = 4096;

/// Smallest modulus accepted for new key pairs.
pub const MIN_RSA_MODULUS_BITS: u32 = 2048;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KryptaConfig {
    pub server: ServerConfig,
    pub crypto: CryptoConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

/// Backend connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// WebSocket endpoint of the backend (`ws://` or `wss://`).
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/websocket".into(),
        }
    }
}

/// Key derivation and generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2-HMAC-SHA-512 iterations for the password-derived login key.
    /// Must match what other clients of the same backend use.
    pub kdf_iterations: u32,
    /// Modulus length for newly generated RSA key pairs.
    pub rsa_modulus_bits: u32,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            rsa_modulus_bits: DEFAULT_RSA_MODULUS_BITS,
        }
    }
}

/// Local persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file holding the local session state.
    /// Defaults to `<data dir>/krypta.db`.
    pub database: Option<PathBuf>,
}

/// Login defaults used by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: Option<String>,
    /// Usually supplied via `${KRYPTA_PASSWORD}` substitution.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub password: Option<Secret<String>>,
    /// Persist the login key locally so later runs start unlocked.
    pub stay_logged_in: bool,
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = KryptaConfig::default();
        assert_eq!(cfg.crypto.kdf_iterations, DEFAULT_KDF_ITERATIONS);
        assert_eq!(cfg.crypto.rsa_modulus_bits, 4096);
        assert!(cfg.server.url.starts_with("ws://"));
        assert!(cfg.storage.database.is_none());
        assert!(!cfg.auth.stay_logged_in);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: KryptaConfig = toml::from_str(
            r#"
            [crypto]
            kdf_iterations = 5000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.crypto.kdf_iterations, 5000);
        assert_eq!(cfg.crypto.rsa_modulus_bits, DEFAULT_RSA_MODULUS_BITS);
    }

    #[test]
    fn password_serializes_exposed() {
        let cfg: KryptaConfig = toml::from_str(
            r#"
            [auth]
            username = "admin"
            password = "hunter2"
            "#,
        )
        .unwrap();
        let out = toml::to_string(&cfg).unwrap();
        assert!(out.contains("hunter2"));
        // Debug output stays redacted.
        assert!(!format!("{:?}", cfg.auth).contains("hunter2"));
    }
}
