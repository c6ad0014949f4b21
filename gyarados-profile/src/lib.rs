//! Profile & persistent state store for the Gyarados browser.
//!
//! This crate manages named user profiles and everything they persist:
//!
//! - Browser settings ([`Config`]), plaintext or password protected
//!   (PBKDF2-HMAC-SHA256 key derivation + Fernet authenticated encryption)
//! - Bookmarks, history, pinned tabs and quick-launch apps as JSON files
//! - Session snapshots of the open tabs
//!
//! Every file is written with a temp-file-then-rename so a crash never leaves
//! a half-written file behind.
//!
//! # Example
//!
//! ```rust,no_run
//! use gyarados_profile::{AppPaths, LogHandle, ProfileStore};
//!
//! let store = ProfileStore::open(AppPaths::resolve(), LogHandle::discard());
//! for name in store.list_profiles()? {
//!     println!("{name}");
//! }
//! let config = store.load_profile("default", |_| None)?;
//! store.history().record_visit(config.profile_name(), "https://example.org", "Example")?;
//! # Ok::<(), gyarados_profile::StoreError>(())
//! ```

#[macro_use]
pub mod logging;

pub mod atomic;
pub mod collections;
pub mod config;
pub mod crypto;
pub mod error;
pub mod paths;
pub mod profile;
pub mod session;
pub mod settings;
pub mod validation;

// Re-export main types for convenience
pub use collections::{
    AppManager, AppShortcut, Bookmark, BookmarkManager, CollectionKind, CollectionManager,
    HistoryAge, HistoryEntry, HistoryManager, PinnedTab, PinnedTabManager,
};
pub use config::{Config, SearchEngine, SettingError};
pub use crypto::{CipherError, Fernet, KeyDerivation, Salt};
pub use error::{Result, StoreError};
pub use logging::LogHandle;
pub use paths::{AppPaths, StoreOptions};
pub use profile::{ProfileStore, SaveOutcome};
pub use session::{RestorePlan, SessionSnapshot, SessionTab};
pub use settings::{FileSettings, MemorySettings, SettingsBackend};
pub use validation::DEFAULT_PROFILE;
