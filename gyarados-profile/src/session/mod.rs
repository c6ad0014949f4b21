//! Session snapshots: the open tabs of a window, saved on exit and reopened
//! on the next launch.
//!
//! A snapshot is independent of the bookmark/history collections; it records
//! exactly the tabs that were open, in order. It is stored as a JSON string
//! under the `session` key of the profile's settings scope.

pub mod capture;
pub mod restore;
pub mod storage;

pub use capture::{OpenTab, capture};
pub use restore::{RestorePlan, TabOpen, restore};

use serde::{Deserialize, Serialize};

/// Settings key holding the serialized snapshot.
pub const SESSION_KEY: &str = "session";

/// Top-level session state of one window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Tabs in tab-bar order.
    #[serde(default)]
    pub tabs: Vec<SessionTab>,
    /// Index of the active tab. Negative when no tab was active.
    #[serde(default)]
    pub current_index: i64,
    #[serde(default)]
    pub dark_theme: bool,
}

/// A single tab in a saved session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTab {
    pub url: String,
    #[serde(default)]
    pub private: bool,
    /// Title set by the user, replacing the page title.
    #[serde(default)]
    pub custom_title: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl SessionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
