//! PBKDF2-HMAC-SHA-512 key derivation for password → login key.

use {sha2::Sha512, zeroize::Zeroizing};

use crate::{aes::AesKey, error::CryptoError};

/// Derive a 256-bit AES-GCM key from a password and salt.
///
/// Deterministic: equal inputs always yield the same key.
pub fn derive_key_from_password(
    password: &str,
    salt: &str,
    iterations: u32,
) -> Result<AesKey, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::Malformed(
            "PBKDF2 iteration count must be positive".to_string(),
        ));
    }

    let mut output = Zeroizing::new([0u8; 32]);
    pbkdf2::pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt.as_bytes(),
        iterations,
        output.as_mut(),
    );

    #[cfg(feature = "tracing")]
    tracing::trace!(iterations, "derived login key");

    Ok(AesKey::from_bytes(*output))
}
