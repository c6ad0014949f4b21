//! The per-profile `Config` entity.
//!
//! Persisted keys use SCREAMING_SNAKE_CASE (`HOME_PAGE`, `DARK_THEME`, ...),
//! the names the browser has always stored, and every field falls back to its
//! default when absent. The bookmark/pinned/app collections and the unlock
//! state ride along in memory but are never part of the serialized settings;
//! they live in their own files.
//!
//! # Sub-modules
//!
//! - [`defaults`]: `default_*` value functions
//! - `methods`: validating setters, search URL expansion, settings-map
//!   conversion

pub mod defaults;
mod methods;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::collections::{AppShortcut, Bookmark, PinnedTab, apps::default_apps};
use crate::crypto::UnlockKey;

/// A search engine URL template. `{}` is replaced by the query and, when
/// `lang_param` is set, `{lang}` by the current language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEngine {
    pub url: String,
    #[serde(default)]
    pub lang_param: bool,
}

/// Rejected setter input.
#[derive(Debug, Error, PartialEq)]
pub enum SettingError {
    #[error("unknown search engine '{0}'")]
    UnknownSearchEngine(String),

    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    #[error("window size must be non-zero, got {0}x{1}")]
    InvalidWindowSize(u32, u32),

    #[error("home page must not be empty")]
    EmptyHomePage,
}

/// Browser settings of one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    // ========================================================================
    // Navigation
    // ========================================================================
    #[serde(default = "crate::config::defaults::home_page")]
    pub home_page: String,

    /// Known engines by display name.
    #[serde(default = "crate::config::defaults::search_engines")]
    pub search_engines: BTreeMap<String, SearchEngine>,

    #[serde(default = "crate::config::defaults::default_search_engine")]
    pub default_search_engine: String,

    // ========================================================================
    // Language
    // ========================================================================
    /// Language code -> display name.
    #[serde(default = "crate::config::defaults::supported_languages")]
    pub supported_languages: BTreeMap<String, String>,

    #[serde(default = "crate::config::defaults::language")]
    pub current_language: String,

    /// Target language of the page translation plugin.
    #[serde(default = "crate::config::defaults::language")]
    pub translate_target_lang: String,

    // ========================================================================
    // Engine & window
    // ========================================================================
    #[serde(default = "crate::config::defaults::user_agent")]
    pub user_agent: String,

    /// `[width, height]` in logical pixels.
    #[serde(default = "crate::config::defaults::window_size")]
    pub window_size: [u32; 2],

    // ========================================================================
    // Privacy
    // ========================================================================
    /// Open new tabs as private tabs.
    #[serde(default = "crate::config::defaults::bool_false")]
    pub private_mode: bool,

    #[serde(default = "crate::config::defaults::bool_true")]
    pub adblock_enabled: bool,

    /// Filter list URLs for the ad blocker.
    #[serde(default = "crate::config::defaults::adblock_lists")]
    pub adblock_lists: Vec<String>,

    #[serde(default = "crate::config::defaults::bool_true")]
    pub cookies_enabled: bool,

    #[serde(default = "crate::config::defaults::bool_true")]
    pub javascript_enabled: bool,

    #[serde(default = "crate::config::defaults::bool_false")]
    pub webgl_enabled: bool,

    /// Restore open tabs on the next launch.
    #[serde(default = "crate::config::defaults::bool_true")]
    pub save_session: bool,

    // ========================================================================
    // Appearance
    // ========================================================================
    #[serde(default = "crate::config::defaults::bool_false")]
    pub dark_theme: bool,

    #[serde(default)]
    pub background_image: Option<String>,

    /// 0.0 (invisible) to 1.0 (opaque).
    #[serde(default = "crate::config::defaults::background_opacity")]
    pub background_opacity: f32,

    /// Style sheet injected into every page.
    #[serde(default)]
    pub custom_css: String,

    // ========================================================================
    // Profiles & integrations
    // ========================================================================
    /// Name of the profile this config belongs to.
    #[serde(default = "crate::config::defaults::current_profile")]
    pub current_profile: String,

    /// Host pattern -> profile name.
    #[serde(default)]
    pub auto_switch_profiles: BTreeMap<String, String>,

    /// Key for the page summary plugin.
    #[serde(default)]
    pub openai_api_key: Option<String>,

    // ========================================================================
    // Runtime only
    // ========================================================================
    /// In-memory copy of `bookmarks.json`.
    #[serde(skip)]
    pub bookmarks: Vec<Bookmark>,

    /// In-memory copy of `pinned_tabs.json`.
    #[serde(skip)]
    pub pinned_tabs: Vec<PinnedTab>,

    /// In-memory copy of `apps.json`.
    #[serde(skip)]
    pub apps: Vec<AppShortcut>,

    #[serde(skip)]
    pub(crate) encrypted: bool,

    /// Key the profile was unlocked with, used to re-encrypt on save.
    #[serde(skip)]
    pub(crate) unlock_key: Option<UnlockKey>,

    /// Collection files that could not be read on load. Saving leaves them
    /// untouched.
    #[serde(skip)]
    pub(crate) unreadable_collections: BTreeSet<&'static str>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_page: defaults::home_page(),
            search_engines: defaults::search_engines(),
            default_search_engine: defaults::default_search_engine(),
            supported_languages: defaults::supported_languages(),
            current_language: defaults::language(),
            translate_target_lang: defaults::language(),
            user_agent: defaults::user_agent(),
            window_size: defaults::window_size(),
            private_mode: defaults::bool_false(),
            adblock_enabled: defaults::bool_true(),
            adblock_lists: defaults::adblock_lists(),
            cookies_enabled: defaults::bool_true(),
            javascript_enabled: defaults::bool_true(),
            webgl_enabled: defaults::bool_false(),
            save_session: defaults::bool_true(),
            dark_theme: defaults::bool_false(),
            background_image: None,
            background_opacity: defaults::background_opacity(),
            custom_css: String::new(),
            current_profile: defaults::current_profile(),
            auto_switch_profiles: BTreeMap::new(),
            openai_api_key: None,
            bookmarks: Vec::new(),
            pinned_tabs: Vec::new(),
            apps: default_apps(),
            encrypted: false,
            unlock_key: None,
            unreadable_collections: BTreeSet::new(),
        }
    }
}
