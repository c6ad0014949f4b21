//! On-disk locations and store-wide options.
//!
//! Layout under the data root:
//!
//! ```text
//! <root>/
//!   profiles/<name>/        profile.meta, config.enc, bookmarks.json, ...
//!   settings/<app>/Browser/ one YAML document per settings scope
//!   logs/                   gyarados.log (+ rotated backups)
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the data root.
pub const HOME_ENV: &str = "GYARADOS_HOME";
/// Application name used for settings scopes.
pub const APP_NAME: &str = "Gyarados Browser";
/// PBKDF2-HMAC-SHA256 rounds for profile passwords.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Resolved directories for one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Use `root` as the data root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the data root: `$GYARADOS_HOME`, then the platform config
    /// directory, then the current directory.
    pub fn resolve() -> Self {
        if let Ok(path) = std::env::var(HOME_ENV)
            && !path.trim().is_empty()
        {
            return Self::new(path);
        }

        let root = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .map(|dir| dir.join("gyarados-browser"))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent directory of every profile directory.
    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join("profiles")
    }

    /// Root of the file-backed settings scopes.
    pub fn settings_dir(&self) -> PathBuf {
        self.root.join("settings")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

/// Knobs for a [`crate::ProfileStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Prefix of every settings scope (`"<app_name>/Browser/<profile>"`).
    pub app_name: String,
    /// PBKDF2 rounds. Changing this makes existing encrypted profiles
    /// unreadable, since the count is not recorded in `profile.meta`.
    pub kdf_iterations: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl StoreOptions {
    /// Settings scope holding the plaintext settings and session of `profile`.
    pub fn settings_scope(&self, profile: &str) -> String {
        format!("{}/Browser/{}", self.app_name, profile)
    }
}
