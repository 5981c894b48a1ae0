//! AES-256-GCM implementation of the [`Cipher`] trait, plus the key and
//! passphrase helpers built on top of it.

#[allow(deprecated)] // upstream generic-array 0.x deprecation
use aes_gcm::{
    AesGcm, KeyInit,
    aead::{Aead, consts::U16, generic_array::GenericArray},
    aes::Aes256,
};
use {
    base64::Engine,
    rand::RngCore,
    sha2::{Digest, Sha256},
    zeroize::Zeroizing,
};

use crate::{error::CryptoError, traits::Cipher};

/// IV size used by every ciphertext this crate produces (128 bits).
pub const IV_LEN: usize = 16;

/// GCM authentication tag size.
const TAG_LEN: usize = 16;

/// AES-256-GCM with a 128-bit IV.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// A 256-bit AES-GCM key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct AesKey(Zeroizing<[u8; 32]>);

impl AesKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesKey(..)")
    }
}

/// AES-256-GCM AEAD cipher.
///
/// Blob layout: `[iv: 16 bytes][ciphertext + GCM tag: N + 16 bytes]`.
pub struct AesGcmCipher;

impl Cipher for AesGcmCipher {
    fn iv_len(&self) -> usize {
        IV_LEN
    }

    #[allow(deprecated)]
    fn encrypt(&self, key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm16::new(key.into());

        let mut iv = [0u8; IV_LEN];
        rand::rng().fill_bytes(&mut iv);

        let ciphertext = cipher
            .encrypt(GenericArray::from_slice(&iv), plaintext)
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        let mut blob = Vec::with_capacity(IV_LEN + ciphertext.len());
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    #[allow(deprecated)]
    fn decrypt(&self, key: &[u8; 32], blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if blob.len() < IV_LEN + TAG_LEN {
            return Err(CryptoError::Malformed("ciphertext too short".to_string()));
        }

        let (iv, ciphertext) = blob.split_at(IV_LEN);
        let cipher = Aes256Gcm16::new(key.into());

        cipher
            .decrypt(GenericArray::from_slice(iv), ciphertext)
            .map_err(|_| CryptoError::Decrypt)
    }
}

/// Encrypt `plaintext` under `key`, returning `base64(iv || ciphertext)`.
///
/// Every call draws a fresh IV, so equal inputs give different outputs.
pub fn encrypt_with_key(plaintext: &[u8], key: &AesKey) -> Result<String, CryptoError> {
    let blob = AesGcmCipher.encrypt(key.as_bytes(), plaintext)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(blob))
}

/// Decrypt a base64 blob produced by [`encrypt_with_key`].
pub fn decrypt_with_key(ciphertext_b64: &str, key: &AesKey) -> Result<Vec<u8>, CryptoError> {
    let blob = base64::engine::general_purpose::STANDARD.decode(ciphertext_b64.trim())?;
    AesGcmCipher.decrypt(key.as_bytes(), &blob)
}

/// Encrypt under a key taken directly from `SHA-256(passphrase)`.
///
/// No key stretching is applied; callers must only use high-entropy
/// passphrases such as generated backup codes.
pub fn encrypt_with_passphrase(plaintext: &[u8], passphrase: &str) -> Result<String, CryptoError> {
    encrypt_with_key(plaintext, &passphrase_key(passphrase))
}

/// Inverse of [`encrypt_with_passphrase`].
pub fn decrypt_with_passphrase(
    ciphertext_b64: &str,
    passphrase: &str,
) -> Result<Vec<u8>, CryptoError> {
    decrypt_with_key(ciphertext_b64, &passphrase_key(passphrase))
}

fn passphrase_key(passphrase: &str) -> AesKey {
    let digest = Sha256::digest(passphrase.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    AesKey::from_bytes(key)
}

/// Generate a random AES-256 key.
pub fn generate_aes_key() -> AesKey {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);
    AesKey::from_bytes(key)
}

/// Export the raw key bytes as base64 (for local persistence).
pub fn export_aes_key_base64(key: &AesKey) -> String {
    base64::engine::general_purpose::STANDARD.encode(key.as_bytes())
}

/// Import a key previously exported with [`export_aes_key_base64`].
pub fn import_aes_key_base64(encoded: &str) -> Result<AesKey, CryptoError> {
    let raw = Zeroizing::new(base64::engine::general_purpose::STANDARD.decode(encoded.trim())?);
    let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        CryptoError::Malformed(format!("AES key has {} bytes, expected 32", raw.len()))
    })?;
    Ok(AesKey::from_bytes(bytes))
}
