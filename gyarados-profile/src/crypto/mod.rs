//! Password protection for encrypted profiles.
//!
//! [`kdf`] turns a password and a per-profile salt into a base64url key,
//! [`cipher`] seals the serialized settings with that key.

pub mod cipher;
pub mod kdf;

pub use cipher::{CipherError, Fernet, extract_timestamp};
pub use kdf::{KEY_LEN, KeyDerivation, SALT_LEN, Salt, derive_key};

use zeroize::Zeroizing;

/// Derived key of an unlocked encrypted profile, held in memory so the
/// profile can be re-encrypted on save without asking for the password again.
#[derive(Clone, PartialEq, Eq)]
pub struct UnlockKey(Zeroizing<String>);

impl UnlockKey {
    pub(crate) fn new(key: Zeroizing<String>) -> Self {
        Self(key)
    }

    /// A cipher for this key.
    pub(crate) fn cipher(&self) -> Result<Fernet, CipherError> {
        Fernet::new(&self.0)
    }
}

impl std::fmt::Debug for UnlockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UnlockKey(..)")
    }
}

/// Encrypt `plaintext` under the base64url `key`.
pub fn encrypt(key: &str, plaintext: &[u8]) -> Result<String, CipherError> {
    Ok(Fernet::new(key)?.encrypt(plaintext))
}

/// Decrypt `token` under the base64url `key`.
///
/// A wrong key and a tampered token are indistinguishable and both yield
/// [`CipherError::InvalidToken`].
pub fn decrypt(key: &str, token: &str) -> Result<Vec<u8>, CipherError> {
    Fernet::new(key)?.decrypt(token)
}
