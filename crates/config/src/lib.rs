//! Configuration loading, env substitution, and validation.
//!
//! Config files: `krypta.toml`, `krypta.yaml`, or `krypta.json`
//! Searched in `./` then `~/.config/krypta/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-fallback}` substitution.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        config_dir, data_dir, database_path, discover_and_load, find_config_file, load_config,
    },
    schema::{
        AuthConfig, CryptoConfig, KryptaConfig, MIN_RSA_MODULUS_BITS, ServerConfig, StorageConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_file},
};
