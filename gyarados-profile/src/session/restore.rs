//! Turn a snapshot back into tab-open instructions.

use super::SessionSnapshot;

/// One tab the host should open, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabOpen {
    pub url: String,
    pub private: bool,
    pub custom_title: Option<String>,
    pub pinned: bool,
}

/// Everything needed to rebuild a window from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePlan {
    /// Tabs to open, in the order they were captured.
    pub tabs: Vec<TabOpen>,
    /// Active tab after restore, already clamped to `tabs`.
    pub current_index: usize,
    pub dark_theme: bool,
}

impl RestorePlan {
    /// Active tab when only `opened` of the planned tabs could actually be
    /// opened. Falls back to 0 when the saved index is out of range.
    pub fn effective_index(&self, opened: usize) -> usize {
        if self.current_index < opened {
            self.current_index
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

/// Build the restore plan for `snapshot`.
pub fn restore(snapshot: &SessionSnapshot) -> RestorePlan {
    let tabs: Vec<TabOpen> = snapshot
        .tabs
        .iter()
        .map(|tab| TabOpen {
            url: tab.url.clone(),
            private: tab.private,
            custom_title: tab.custom_title.clone(),
            pinned: tab.pinned,
        })
        .collect();

    let current_index = usize::try_from(snapshot.current_index)
        .ok()
        .filter(|&index| index < tabs.len())
        .unwrap_or(0);

    RestorePlan {
        tabs,
        current_index,
        dark_theme: snapshot.dark_theme,
    }
}
