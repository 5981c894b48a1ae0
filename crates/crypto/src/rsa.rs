//! RSA-OAEP key pairs with SHA-512, PEM import/export.
//!
//! Private keys are exchanged as PKCS#8 PEM (`BEGIN PRIVATE KEY`), public
//! keys as SPKI PEM (`BEGIN PUBLIC KEY`).

use openssl::{
    bn::BigNum,
    encrypt::{Decrypter, Encrypter},
    hash::MessageDigest,
    pkey::{PKey, Private, Public},
    rsa::{Padding, Rsa},
};

use crate::error::CryptoError;

/// Fixed public exponent.
const PUBLIC_EXPONENT: u32 = 65_537;

/// Which half of a key pair a PEM string holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Private,
    Public,
}

#[derive(Clone)]
enum Inner {
    Private(PKey<Private>),
    Public(PKey<Public>),
}

/// An RSA-OAEP key (either half). Export is refused unless `exportable`.
#[derive(Clone)]
pub struct RsaKey {
    inner: Inner,
    exportable: bool,
}

impl RsaKey {
    pub fn mode(&self) -> KeyMode {
        match self.inner {
            Inner::Private(_) => KeyMode::Private,
            Inner::Public(_) => KeyMode::Public,
        }
    }

    pub fn is_exportable(&self) -> bool {
        self.exportable
    }

    /// Modulus length in bits.
    pub fn bits(&self) -> u32 {
        match &self.inner {
            Inner::Private(k) => k.bits(),
            Inner::Public(k) => k.bits(),
        }
    }
}

impl std::fmt::Debug for RsaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKey")
            .field("mode", &self.mode())
            .field("bits", &self.bits())
            .field("exportable", &self.exportable)
            .finish()
    }
}

/// A freshly generated key pair.
#[derive(Debug, Clone)]
pub struct RsaKeyPair {
    pub private_key: RsaKey,
    pub public_key: RsaKey,
}

/// Generate an RSA-OAEP key pair with exponent 65537.
///
/// The public half is always exportable; `exportable` applies to the
/// private half.
pub fn generate_rsa_key_pair(
    exportable: bool,
    modulus_bits: u32,
) -> Result<RsaKeyPair, CryptoError> {
    let exponent = BigNum::from_u32(PUBLIC_EXPONENT)?;
    let rsa = Rsa::generate_with_e(modulus_bits, &exponent)?;
    let private = PKey::from_rsa(rsa)?;
    let public = PKey::public_key_from_der(&private.public_key_to_der()?)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(modulus_bits, "generated RSA key pair");

    Ok(RsaKeyPair {
        private_key: RsaKey {
            inner: Inner::Private(private),
            exportable,
        },
        public_key: RsaKey {
            inner: Inner::Public(public),
            exportable: true,
        },
    })
}

/// Export a key as PEM: PKCS#8 for private keys, SPKI for public keys.
pub fn export_key_to_pem(key: &RsaKey) -> Result<String, CryptoError> {
    if !key.exportable {
        return Err(CryptoError::NotExportable);
    }
    let pem = match &key.inner {
        Inner::Private(k) => k.private_key_to_pem_pkcs8()?,
        Inner::Public(k) => k.public_key_to_pem()?,
    };
    Ok(String::from_utf8(pem)?)
}

/// Import a PEM string produced by [`export_key_to_pem`].
pub fn import_key_from_pem(
    pem: &str,
    mode: KeyMode,
    exportable: bool,
) -> Result<RsaKey, CryptoError> {
    let inner = match mode {
        KeyMode::Private => {
            let key = PKey::private_key_from_pem(pem.as_bytes())?;
            ensure_rsa(key.rsa().is_ok())?;
            Inner::Private(key)
        },
        KeyMode::Public => {
            let key = PKey::public_key_from_pem(pem.as_bytes())?;
            ensure_rsa(key.rsa().is_ok())?;
            Inner::Public(key)
        },
    };
    Ok(RsaKey { inner, exportable })
}

fn ensure_rsa(is_rsa: bool) -> Result<(), CryptoError> {
    if is_rsa {
        Ok(())
    } else {
        Err(CryptoError::Malformed("PEM does not hold an RSA key".to_string()))
    }
}

/// Encrypt `data` with RSA-OAEP (SHA-512 for both OAEP and MGF1).
///
/// Either half can encrypt: a private key carries its public components.
pub fn rsa_encrypt(key: &RsaKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    match &key.inner {
        Inner::Private(k) => oaep_encrypt(Encrypter::new(k)?, data),
        Inner::Public(k) => oaep_encrypt(Encrypter::new(k)?, data),
    }
}

fn oaep_encrypt(mut encrypter: Encrypter<'_>, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    encrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
    encrypter.set_rsa_oaep_md(MessageDigest::sha512())?;
    encrypter.set_rsa_mgf1_md(MessageDigest::sha512())?;

    let mut out = vec![0u8; encrypter.encrypt_len(data)?];
    let len = encrypter.encrypt(data, &mut out)?;
    out.truncate(len);
    Ok(out)
}

/// Decrypt an RSA-OAEP ciphertext. Requires the private half.
pub fn rsa_decrypt(key: &RsaKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let Inner::Private(k) = &key.inner else {
        return Err(CryptoError::WrongKeyMode {
            expected: "private",
        });
    };

    let mut decrypter = Decrypter::new(k)?;
    decrypter.set_rsa_padding(Padding::PKCS1_OAEP)?;
    decrypter.set_rsa_oaep_md(MessageDigest::sha512())?;
    decrypter.set_rsa_mgf1_md(MessageDigest::sha512())?;

    let mut out = vec![0u8; decrypter.decrypt_len(ciphertext)?];
    let len = decrypter
        .decrypt(ciphertext, &mut out)
        .map_err(|_| CryptoError::Decrypt)?;
    out.truncate(len);
    Ok(out)
}
