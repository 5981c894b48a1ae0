//! Backup code generation, display formatting and normalization.
//!
//! A backup code is 128 characters from a 64-symbol alphabet (768 bits). The
//! private key PEM is encrypted under `SHA-256(code)`; see
//! [`krypta_crypto::encrypt_with_passphrase`].

use zeroize::Zeroizing;

use krypta_crypto::CryptoError;

/// Number of characters in a backup code.
pub const BACKUP_CODE_LEN: usize = 128;

/// Characters per display group.
const GROUP_LEN: usize = 4;

/// Character set for backup codes (64 symbols, URL-safe base64 alphabet).
pub const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// A generated backup code. Shown to the user exactly once, never stored.
pub struct BackupCode {
    code: Zeroizing<String>,
}

impl BackupCode {
    /// Generate a new random code.
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self {
            code: Zeroizing::new(krypta_crypto::random_string(BACKUP_CODE_LEN, CHARSET)?),
        })
    }

    /// The raw code, as used for key derivation.
    pub fn as_str(&self) -> &str {
        &self.code
    }

    /// Space-separated groups of four for display.
    pub fn display(&self) -> String {
        format_groups(&self.code)
    }
}

impl std::fmt::Debug for BackupCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BackupCode(..)")
    }
}

fn format_groups(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    chars
        .chunks(GROUP_LEN)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip all whitespace from user input (spaces, tabs, line breaks).
pub fn normalize(input: &str) -> Zeroizing<String> {
    Zeroizing::new(input.chars().filter(|c| !c.is_whitespace()).collect())
}
