//! Configuration validation.
//!
//! Checks values that parse fine but would break key management or weaken it.

use std::path::{Path, PathBuf};

use crate::{
    loader::load_config,
    schema::{KryptaConfig, MIN_RSA_MODULUS_BITS},
};

/// Below this PBKDF2 count the login key is considered weak.
const MIN_RECOMMENDED_ITERATIONS: u32 = 100_000;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "value", "security"
    pub category: &'static str,
    /// Dotted path, e.g. "crypto.kdf_iterations"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(
        &mut self,
        severity: Severity,
        category: &'static str,
        path: &str,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Load and validate a config file. Parse failures become a `syntax` error.
pub fn validate_file(path: &Path) -> ValidationResult {
    match load_config(path) {
        Ok(config) => {
            let mut result = validate(&config);
            result.config_path = Some(path.to_path_buf());
            result
        },
        Err(e) => {
            let mut result = ValidationResult {
                config_path: Some(path.to_path_buf()),
                ..Default::default()
            };
            result.push(Severity::Error, "syntax", "", e.to_string());
            result
        },
    }
}

/// Validate an already-parsed config.
pub fn validate(config: &KryptaConfig) -> ValidationResult {
    let mut result = ValidationResult::default();
    check_server(config, &mut result);
    check_crypto(config, &mut result);
    check_auth(config, &mut result);
    result
}

fn check_server(config: &KryptaConfig, result: &mut ValidationResult) {
    let url = match url::Url::parse(&config.server.url) {
        Ok(url) => url,
        Err(e) => {
            result.push(
                Severity::Error,
                "value",
                "server.url",
                format!("invalid URL: {e}"),
            );
            return;
        },
    };

    match url.scheme() {
        "wss" => {},
        "ws" => {
            let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
            if !loopback {
                result.push(
                    Severity::Warning,
                    "security",
                    "server.url",
                    "unencrypted ws:// to a non-local host exposes passwords in transit",
                );
            }
        },
        other => result.push(
            Severity::Error,
            "value",
            "server.url",
            format!("scheme must be ws or wss, got {other}"),
        ),
    }
}

fn check_crypto(config: &KryptaConfig, result: &mut ValidationResult) {
    let crypto = &config.crypto;

    if crypto.kdf_iterations == 0 {
        result.push(
            Severity::Error,
            "value",
            "crypto.kdf_iterations",
            "must be positive",
        );
    } else if crypto.kdf_iterations < MIN_RECOMMENDED_ITERATIONS {
        result.push(
            Severity::Warning,
            "security",
            "crypto.kdf_iterations",
            format!(
                "{} iterations is below the recommended minimum of {MIN_RECOMMENDED_ITERATIONS}",
                crypto.kdf_iterations
            ),
        );
    }

    if crypto.rsa_modulus_bits < MIN_RSA_MODULUS_BITS {
        result.push(
            Severity::Error,
            "value",
            "crypto.rsa_modulus_bits",
            format!("must be at least {MIN_RSA_MODULUS_BITS}"),
        );
    } else if crypto.rsa_modulus_bits % 8 != 0 {
        result.push(
            Severity::Error,
            "value",
            "crypto.rsa_modulus_bits",
            "must be a multiple of 8",
        );
    }
}

fn check_auth(config: &KryptaConfig, result: &mut ValidationResult) {
    if config.auth.password.is_some() && config.auth.username.is_none() {
        result.push(
            Severity::Warning,
            "value",
            "auth.password",
            "password is set but auth.username is not",
        );
    }
}
