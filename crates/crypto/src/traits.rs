//! Cipher trait for swappable authenticated encryption backends.

use crate::error::CryptoError;

/// Authenticated symmetric encryption with a 256-bit key.
///
/// Implementations generate a fresh IV per call and return
/// `[iv || ciphertext || tag]`, which [`decrypt`](Self::decrypt) must accept.
pub trait Cipher: Send + Sync {
    /// Length of the IV prefix in bytes.
    fn iv_len(&self) -> usize;

    /// Encrypt `plaintext` under `key` with a fresh random IV.
    fn encrypt(&self, key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Decrypt a blob previously produced by [`encrypt`](Self::encrypt).
    ///
    /// Must fail, never return garbage, when the key or data is wrong.
    fn decrypt(&self, key: &[u8; 32], blob: &[u8]) -> Result<Vec<u8>, CryptoError>;
}
