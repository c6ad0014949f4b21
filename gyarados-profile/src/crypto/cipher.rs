//! Fernet authenticated encryption.
//!
//! Token layout before base64url encoding:
//!
//! ```text
//! 0x80 | timestamp (u64 BE) | IV (16) | AES-128-CBC ciphertext (PKCS#7) | HMAC-SHA256 (32)
//! ```
//!
//! The HMAC covers everything before it. The 32-byte key is split into a
//! signing half and an encryption half. Tokens are interchangeable with other
//! Fernet implementations, so profiles written by earlier releases stay
//! readable.

use aes::Aes128;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use zeroize::Zeroize;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type HmacSha256 = Hmac<Sha256>;

const VERSION: u8 = 0x80;
const IV_LEN: usize = 16;
const HMAC_LEN: usize = 32;
const BLOCK_LEN: usize = 16;
const HEADER_LEN: usize = 1 + 8 + IV_LEN;
/// Tokens stamped further than this into the future are rejected.
const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Cipher failures. Everything that can go wrong with a token collapses into
/// [`CipherError::InvalidToken`] so callers cannot tell a wrong key from a
/// flipped bit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid or tampered token")]
    InvalidToken,

    #[error("{0}")]
    InvalidKey(String),
}

/// A Fernet key: 16 signing bytes followed by 16 encryption bytes.
pub struct Fernet {
    /// Keyed with the signing half; cloned for every token.
    mac: HmacSha256,
    encryption_key: [u8; 16],
}

impl Drop for Fernet {
    fn drop(&mut self) {
        self.encryption_key.zeroize();
    }
}

impl std::fmt::Debug for Fernet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Fernet(..)")
    }
}

impl Fernet {
    /// Build from a base64url-encoded 32-byte key.
    pub fn new(key: &str) -> Result<Self, CipherError> {
        let mut raw = URL_SAFE
            .decode(key.trim().as_bytes())
            .map_err(|e| CipherError::InvalidKey(format!("key is not base64url: {e}")))?;
        if raw.len() != 32 {
            let len = raw.len();
            raw.zeroize();
            return Err(CipherError::InvalidKey(format!(
                "key must be 32 bytes, got {len}"
            )));
        }

        let mac = <HmacSha256 as Mac>::new_from_slice(&raw[..16])
            .map_err(|e| CipherError::InvalidKey(e.to_string()));
        let mut encryption_key = [0u8; 16];
        encryption_key.copy_from_slice(&raw[16..]);
        raw.zeroize();

        Ok(Self {
            mac: mac?,
            encryption_key,
        })
    }

    /// A fresh random key, base64url-encoded.
    pub fn generate_key() -> String {
        let mut raw = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut raw);
        let key = URL_SAFE.encode(raw);
        raw.zeroize();
        key
    }

    /// Encrypt with the current time and a random IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> String {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        self.encrypt_at(plaintext, unix_now(), iv)
    }

    /// Encrypt with an explicit timestamp and IV.
    pub fn encrypt_at(&self, plaintext: &[u8], timestamp: u64, iv: [u8; IV_LEN]) -> String {
        let ciphertext = Aes128CbcEnc::new(&self.encryption_key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len() + HMAC_LEN);
        token.push(VERSION);
        token.extend_from_slice(&timestamp.to_be_bytes());
        token.extend_from_slice(&iv);
        token.extend_from_slice(&ciphertext);

        let tag = self.sign(&token);
        token.extend_from_slice(&tag);

        URL_SAFE.encode(token)
    }

    /// Verify and decrypt `token`, with no age limit.
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, CipherError> {
        self.decrypt_with_ttl(token, None)
    }

    /// Verify and decrypt `token`, rejecting tokens older than `ttl`.
    pub fn decrypt_with_ttl(
        &self,
        token: &str,
        ttl: Option<Duration>,
    ) -> Result<Vec<u8>, CipherError> {
        let data = decode_token(token)?;
        let timestamp = token_timestamp(&data);

        let now = unix_now();
        if let Some(ttl) = ttl
            && timestamp.saturating_add(ttl.as_secs()) < now
        {
            return Err(CipherError::InvalidToken);
        }
        if now.saturating_add(MAX_CLOCK_SKEW_SECS) < timestamp {
            return Err(CipherError::InvalidToken);
        }

        let (signed, tag) = data.split_at(data.len() - HMAC_LEN);
        let mut mac = self.mac.clone();
        mac.update(signed);
        mac.verify_slice(tag).map_err(|_| CipherError::InvalidToken)?;

        let iv = &signed[9..HEADER_LEN];
        let ciphertext = &signed[HEADER_LEN..];
        Aes128CbcDec::new_from_slices(&self.encryption_key, iv)
            .map_err(|_| CipherError::InvalidToken)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::InvalidToken)
    }

    fn sign(&self, data: &[u8]) -> [u8; HMAC_LEN] {
        let mut mac = self.mac.clone();
        mac.update(data);
        let mut tag = [0u8; HMAC_LEN];
        tag.copy_from_slice(&mac.finalize().into_bytes());
        tag
    }
}

/// Creation time (seconds since the Unix epoch) embedded in a token.
///
/// Does not verify the token.
pub fn extract_timestamp(token: &str) -> Result<u64, CipherError> {
    decode_token(token).map(|data| token_timestamp(&data))
}

fn decode_token(token: &str) -> Result<Vec<u8>, CipherError> {
    let data = URL_SAFE
        .decode(token.trim().as_bytes())
        .map_err(|_| CipherError::InvalidToken)?;

    // At least one ciphertext block, and the ciphertext is whole blocks.
    if data.len() < HEADER_LEN + BLOCK_LEN + HMAC_LEN
        || (data.len() - HEADER_LEN - HMAC_LEN) % BLOCK_LEN != 0
        || data[0] != VERSION
    {
        return Err(CipherError::InvalidToken);
    }
    Ok(data)
}

fn token_timestamp(data: &[u8]) -> u64 {
    let mut ts = [0u8; 8];
    ts.copy_from_slice(&data[1..9]);
    u64::from_be_bytes(ts)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
