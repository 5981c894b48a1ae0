//! Crypto error types.

/// Errors produced by the crypto primitives.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Authenticated decryption failed (wrong key, tampered or truncated data).
    #[error("decryption failed")]
    Decrypt,

    /// Encryption failed inside the AEAD backend.
    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// Input had the wrong shape (length, encoding, parameters).
    #[error("malformed input: {0}")]
    Malformed(String),

    /// The key was created as non-exportable.
    #[error("key is not exportable")]
    NotExportable,

    /// A private key was required but a public key was supplied (or vice versa).
    #[error("wrong key mode: expected {expected}")]
    WrongKeyMode { expected: &'static str },

    /// Base64 decoding failed.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// OpenSSL reported an error (RSA generation, PEM parsing, OAEP).
    #[error("openssl error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    /// Decrypted bytes were expected to be UTF-8 text.
    #[error("plaintext is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
