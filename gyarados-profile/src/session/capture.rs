//! Capture session state from live tabs.

use super::{SessionSnapshot, SessionTab};

/// Read access to an open tab, implemented by the host's tab type.
pub trait OpenTab {
    fn url(&self) -> String;
    fn is_private(&self) -> bool;
    fn custom_title(&self) -> Option<String>;
    fn is_pinned(&self) -> bool;
}

impl OpenTab for SessionTab {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn is_private(&self) -> bool {
        self.private
    }

    fn custom_title(&self) -> Option<String> {
        self.custom_title.clone()
    }

    fn is_pinned(&self) -> bool {
        self.pinned
    }
}

/// Snapshot `open_tabs` in order.
pub fn capture<'a, T, I>(open_tabs: I, current_index: i64, dark_theme: bool) -> SessionSnapshot
where
    T: OpenTab + ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let tabs = open_tabs
        .into_iter()
        .map(|tab| SessionTab {
            url: tab.url(),
            private: tab.is_private(),
            // An empty custom title means "use the page title".
            custom_title: tab.custom_title().filter(|t| !t.is_empty()),
            pinned: tab.is_pinned(),
        })
        .collect();

    SessionSnapshot {
        tabs,
        current_index,
        dark_theme,
    }
}
