//! Pinned tabs.

use serde::{Deserialize, Serialize};

use super::CollectionKind;

/// A tab pinned to the tab bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedTab {
    #[serde(alias = "name")]
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// `pinned_tabs.json`
#[derive(Debug, Clone, Copy)]
pub struct PinnedTabs;

impl CollectionKind for PinnedTabs {
    type Item = PinnedTab;
    const FILE_NAME: &'static str = "pinned_tabs.json";
    const TARGET: &'static str = "PINNED";
}
