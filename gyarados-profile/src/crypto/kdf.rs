//! Password-based key derivation.
//!
//! PBKDF2-HMAC-SHA256, 32-byte output, base64url-encoded so the result is a
//! ready-to-use [`super::Fernet`] key.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::paths::DEFAULT_KDF_ITERATIONS;

/// Length of a per-profile salt.
pub const SALT_LEN: usize = 16;
/// Length of the raw derived key.
pub const KEY_LEN: usize = 32;

/// Random per-profile salt. Generated once at profile creation and stored in
/// `profile.meta`; never regenerated on load.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Fresh salt from the OS-seeded thread RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    /// `None` unless `bytes` is exactly [`SALT_LEN`] long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; SALT_LEN]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Salt(")?;
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        f.write_str(")")
    }
}

/// Key derivation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivation {
    pub iterations: u32,
}

impl Default for KeyDerivation {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl KeyDerivation {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Derive the base64url-encoded key for `password` and `salt`.
    ///
    /// Deterministic: the same inputs always yield the same key.
    pub fn derive(&self, password: &[u8], salt: &Salt) -> Zeroizing<String> {
        let mut raw = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt.as_bytes(), self.iterations, &mut raw);
        let encoded = Zeroizing::new(URL_SAFE.encode(raw));
        raw.zeroize();
        encoded
    }
}

/// Derive with the default iteration count.
pub fn derive_key(password: &str, salt: &Salt) -> Zeroizing<String> {
    KeyDerivation::default().derive(password.as_bytes(), salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbkdf2_sha256_reference_vector() {
        // Widely published vector: P="password", S="salt", c=1, dkLen=32.
        let salt_bytes = b"salt";
        let mut raw = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(b"password", salt_bytes, 1, &mut raw);
        assert_eq!(URL_SAFE.encode(raw), "Eg-2z_z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs=");
    }

    #[test]
    fn test_default_iterations_match_stored_profiles() {
        let salt = Salt::from_bytes(core::array::from_fn(|i| i as u8));
        let key = derive_key("correct horse", &salt);
        assert_eq!(key.as_str(), "V_LC8HOXSNUWQZsGKohGZjI8WD6krhZVBKgfe1PGKgk=");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let kdf = KeyDerivation::new(1_000);
        let salt = Salt::generate();
        assert_eq!(*kdf.derive(b"hunter2", &salt), *kdf.derive(b"hunter2", &salt));
    }

    #[test]
    fn test_salt_and_password_both_matter() {
        let kdf = KeyDerivation::new(1_000);
        let a = Salt::from_bytes([1; SALT_LEN]);
        let b = Salt::from_bytes([2; SALT_LEN]);
        assert_ne!(*kdf.derive(b"same", &a), *kdf.derive(b"same", &b));
        assert_ne!(*kdf.derive(b"one", &a), *kdf.derive(b"two", &a));
    }

    #[test]
    fn test_salt_from_slice_checks_length() {
        assert!(Salt::from_slice(&[0u8; 15]).is_none());
        assert!(Salt::from_slice(&[0u8; 17]).is_none());
        assert!(Salt::from_slice(&[7u8; 16]).is_some());
    }

    #[test]
    fn test_generated_salts_differ() {
        assert_ne!(Salt::generate(), Salt::generate());
    }

    #[test]
    fn test_unicode_password() {
        let kdf = KeyDerivation::new(10);
        let key = kdf.derive("пароль".as_bytes(), &Salt::from_bytes([0; SALT_LEN]));
        assert_eq!(URL_SAFE.decode(key.as_bytes()).unwrap().len(), KEY_LEN);
    }
}
