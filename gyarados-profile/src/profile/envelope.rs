//! On-disk envelope of encrypted profiles.
//!
//! An encrypted profile has two files:
//!
//! - `profile.meta`: the literal marker `ENCRYPTED:` followed by the 16-byte
//!   salt the profile key is derived with
//! - `config.enc`: a Fernet token holding the JSON-serialized settings
//!
//! A profile without the marker is plaintext. The marker is written last, so
//! a profile is never marked encrypted without a settings token next to it.
//! The salt never changes after creation: saves and password changes replace
//! `config.enc` alone.

use serde_json::{Map, Value};
use std::path::Path;

use crate::atomic;
use crate::config::Config;
use crate::crypto::{SALT_LEN, Salt, UnlockKey};
use crate::error::{Result, StoreError};

pub const META_FILE: &str = "profile.meta";
pub const CONFIG_BLOB_FILE: &str = "config.enc";
pub const ENCRYPTED_MARKER: &[u8] = b"ENCRYPTED:";

/// What `profile.meta` says about a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Plaintext,
    Encrypted(Salt),
}

impl ProfileKind {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, ProfileKind::Encrypted(_))
    }
}

/// Inspect `profile.meta` in `dir`.
pub fn read_kind(dir: &Path) -> Result<ProfileKind> {
    let path = dir.join(META_FILE);
    let Some(bytes) = atomic::read_bytes(&path)? else {
        return Ok(ProfileKind::Plaintext);
    };
    let Some(salt_bytes) = bytes.strip_prefix(ENCRYPTED_MARKER) else {
        return Ok(ProfileKind::Plaintext);
    };
    Salt::from_slice(salt_bytes)
        .map(ProfileKind::Encrypted)
        .ok_or_else(|| {
            StoreError::Profile(format!(
                "{} holds a {}-byte salt, expected {}",
                path.display(),
                salt_bytes.len(),
                SALT_LEN
            ))
        })
}

pub fn encode_meta(salt: &Salt) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(ENCRYPTED_MARKER.len() + SALT_LEN);
    bytes.extend_from_slice(ENCRYPTED_MARKER);
    bytes.extend_from_slice(salt.as_bytes());
    bytes
}

/// Encrypt the persisted fields of `config`.
pub fn seal(config: &Config, key: &UnlockKey) -> Result<String> {
    let json = serde_json::to_vec(&Value::Object(config.to_settings()?))?;
    Ok(key.cipher()?.encrypt(&json))
}

/// Decrypt and parse a settings token.
///
/// A wrong key or a tampered token is [`StoreError::Authentication`]; a token
/// that decrypts to something other than a settings map is
/// [`StoreError::Profile`].
pub fn unseal(token: &str, key: &UnlockKey) -> Result<Config> {
    let plaintext = key.cipher()?.decrypt(token)?;
    let map: Map<String, Value> = serde_json::from_slice(&plaintext)
        .map_err(|e| StoreError::Profile(format!("decrypted settings are not a JSON map: {e}")))?;
    Config::from_settings(map)
        .map_err(|e| StoreError::Profile(format!("decrypted settings are malformed: {e}")))
}

/// Read the settings token of the encrypted profile in `dir`.
pub fn read_token(dir: &Path) -> Result<String> {
    let path = dir.join(CONFIG_BLOB_FILE);
    let bytes = atomic::read_bytes(&path)?.ok_or_else(|| {
        StoreError::Profile(format!(
            "encrypted profile is missing {}",
            path.display()
        ))
    })?;
    String::from_utf8(bytes)
        .map_err(|_| StoreError::Profile(format!("{} is not a text token", path.display())))
}

/// Write `config.enc` only, keeping the current salt.
pub fn write_token(dir: &Path, token: &str) -> Result<()> {
    atomic::write_bytes(&dir.join(CONFIG_BLOB_FILE), token.as_bytes())
}

/// Write a complete envelope for a new profile: both files are staged first,
/// then the token and finally the marker are committed.
pub fn write_envelope(dir: &Path, salt: &Salt, token: &str) -> Result<()> {
    let blob = atomic::stage(&dir.join(CONFIG_BLOB_FILE), token.as_bytes())?;
    let meta = atomic::stage(&dir.join(META_FILE), &encode_meta(salt))?;
    blob.commit()?;
    meta.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyDerivation;
    use tempfile::tempdir;

    fn key(password: &str, salt: &Salt) -> UnlockKey {
        UnlockKey::new(KeyDerivation::new(1_000).derive(password.as_bytes(), salt))
    }

    #[test]
    fn test_missing_meta_is_plaintext() {
        let temp = tempdir().unwrap();
        assert_eq!(read_kind(temp.path()).unwrap(), ProfileKind::Plaintext);
    }

    #[test]
    fn test_meta_without_marker_is_plaintext() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(META_FILE), b"PLAIN").unwrap();
        assert_eq!(read_kind(temp.path()).unwrap(), ProfileKind::Plaintext);
    }

    #[test]
    fn test_meta_round_trip() {
        let temp = tempdir().unwrap();
        let salt = Salt::from_bytes([9; SALT_LEN]);
        atomic::write_bytes(&temp.path().join(META_FILE), &encode_meta(&salt)).unwrap();

        let raw = std::fs::read(temp.path().join(META_FILE)).unwrap();
        assert!(raw.starts_with(b"ENCRYPTED:"));
        assert_eq!(raw.len(), 10 + 16);
        assert_eq!(read_kind(temp.path()).unwrap(), ProfileKind::Encrypted(salt));
    }

    #[test]
    fn test_short_salt_is_profile_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(META_FILE), b"ENCRYPTED:short").unwrap();
        assert!(matches!(read_kind(temp.path()), Err(StoreError::Profile(_))));
    }

    #[test]
    fn test_seal_unseal() {
        let salt = Salt::generate();
        let mut config = Config::for_profile("vault");
        config.dark_theme = true;
        config.openai_api_key = Some("sk-test".into());

        let token = seal(&config, &key("pw", &salt)).unwrap();
        let back = unseal(&token, &key("pw", &salt)).unwrap();

        assert_eq!(back.current_profile, "vault");
        assert!(back.dark_theme);
        assert_eq!(back.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_unseal_with_wrong_key_is_authentication() {
        let salt = Salt::generate();
        let token = seal(&Config::default(), &key("right", &salt)).unwrap();
        let err = unseal(&token, &key("wrong", &salt)).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_write_envelope_writes_both_files() {
        let temp = tempdir().unwrap();
        let salt = Salt::generate();
        write_envelope(temp.path(), &salt, "token").unwrap();

        assert_eq!(read_kind(temp.path()).unwrap(), ProfileKind::Encrypted(salt));
        assert_eq!(read_token(temp.path()).unwrap(), "token");
    }

    #[test]
    fn test_missing_token_is_profile_error() {
        let temp = tempdir().unwrap();
        assert!(matches!(read_token(temp.path()), Err(StoreError::Profile(_))));
    }
}
