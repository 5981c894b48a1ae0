//! End-to-end key management for a krypta login.
//!
//! An RSA-OAEP key pair is generated client-side. The private key is stored
//! server-side twice: once under the password-derived login key and once under
//! a one-time-displayed backup code. [`KeyManager`] drives the lifecycle
//! (inactive, locked, unlocked) over a [`Transport`], with [`Session`] holding
//! the login key and [`LocalStore`] persisting it across restarts.

pub mod backup;
pub mod error;
pub mod field;
pub mod manager;
pub mod memory;
pub mod policy;
pub mod session;
pub mod state;
pub mod store;
pub mod transport;

pub use {
    backup::BackupCode,
    error::{ErrorKind, KeyError, StoreError, TransportError},
    field::SealedField,
    manager::{KeyCreation, KeyManager, KeyParams},
    memory::{MemoryBackend, MemoryTransport},
    policy::Violation,
    session::Session,
    state::{EncryptionState, EncryptionStatus},
    store::{LocalStore, MemoryStore, SqliteStore, run_migrations},
    transport::{Transport, WsTransport},
};
