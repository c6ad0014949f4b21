//! Typed error variants for the gyarados-profile crate.
//!
//! Every fallible store operation returns [`StoreError`]. Callers that only
//! want to know whether to re-prompt for a password or fall back to an empty
//! collection can use [`StoreError::is_authentication`] and
//! [`StoreError::is_recoverable`] instead of matching on every variant.
//!
//! # Example
//!
//! ```rust,no_run
//! use gyarados_profile::StoreError;
//!
//! fn describe(err: &StoreError) -> &'static str {
//!     match err {
//!         StoreError::Authentication => "wrong password, ask again",
//!         StoreError::NotFound(_) => "start from defaults",
//!         StoreError::AlreadyExists(_) => "pick another name",
//!         _ => "abort and report",
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::crypto::CipherError;

/// Errors produced by the profile store and its collections.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A profile or file does not exist.
    ///
    /// Recoverable: collection loaders turn this into an empty collection.
    #[error("profile '{0}' not found")]
    NotFound(String),

    /// Creating a profile whose directory already exists.
    #[error("profile '{0}' already exists")]
    AlreadyExists(String),

    /// Wrong password, or the encrypted settings were corrupted or tampered
    /// with. No partially decrypted data is ever returned alongside it.
    #[error("authentication failed: wrong password or corrupted profile data")]
    Authentication,

    /// The password provider declined to supply a password.
    #[error("a password is required to open profile '{0}'")]
    PasswordRequired(String),

    /// A file system error. On-disk state is left at the last committed
    /// version because every write goes through an atomic rename.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed profile metadata or an undecodable payload.
    #[error("profile error: {0}")]
    Profile(String),

    /// The profile name cannot be used as a single directory component.
    #[error("invalid profile name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// The operation is refused by store policy (e.g. deleting `default`).
    #[error("operation refused: {0}")]
    Policy(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding of a settings scope failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl StoreError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True when the caller should treat the failure as "empty / default".
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// True when the caller should re-prompt for a password.
    pub fn is_authentication(&self) -> bool {
        matches!(self, StoreError::Authentication)
    }
}

impl From<CipherError> for StoreError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::InvalidToken => StoreError::Authentication,
            CipherError::InvalidKey(msg) => StoreError::Profile(format!("invalid key: {msg}")),
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
