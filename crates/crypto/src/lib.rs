//! Crypto primitives for end-to-end key management.
//!
//! Thin, stateless wrappers over AES-256-GCM, PBKDF2-HMAC-SHA-512 and
//! RSA-OAEP (SHA-512). Ciphertexts are exchanged as base64 strings of
//! `[iv: 16 bytes][ciphertext + tag]`. The [`Cipher`] trait keeps the AEAD
//! backend swappable.

pub mod aes;
pub mod error;
pub mod kdf;
pub mod random;
pub mod rsa;
pub mod traits;

pub use {
    aes::{
        AesGcmCipher, AesKey, decrypt_with_key, decrypt_with_passphrase, encrypt_with_key,
        encrypt_with_passphrase, export_aes_key_base64, generate_aes_key, import_aes_key_base64,
    },
    error::CryptoError,
    kdf::derive_key_from_password,
    random::random_string,
    rsa::{
        KeyMode, RsaKey, RsaKeyPair, export_key_to_pem, generate_rsa_key_pair, import_key_from_pem,
        rsa_decrypt, rsa_encrypt,
    },
    traits::Cipher,
};
