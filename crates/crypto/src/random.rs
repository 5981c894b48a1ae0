//! Random string generation for backup codes and salts.

use rand::Rng;

use crate::error::CryptoError;

/// Generate `len` characters drawn uniformly from `alphabet`.
///
/// Fails on an empty alphabet or one that is not plain ASCII.
pub fn random_string(len: usize, alphabet: &[u8]) -> Result<String, CryptoError> {
    if alphabet.is_empty() || !alphabet.is_ascii() {
        return Err(CryptoError::Malformed(
            "alphabet must be non-empty ASCII".to_string(),
        ));
    }

    let mut rng = rand::rng();
    Ok((0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect())
}
