//! Quick-launch app shortcuts.

use serde::{Deserialize, Serialize};

use super::CollectionKind;

/// Icon shown for shortcuts that do not name one.
pub const DEFAULT_APP_ICON: &str = "web-browser";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppShortcut {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl AppShortcut {
    pub fn new(name: &str, url: &str, icon: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            icon: icon.map(str::to_string),
        }
    }

    pub fn icon_or_default(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_APP_ICON)
    }
}

/// Shortcuts every new profile starts with.
pub fn default_apps() -> Vec<AppShortcut> {
    vec![
        AppShortcut::new("Gmail", "https://mail.google.com", Some("mail")),
        AppShortcut::new("YouTube", "https://youtube.com", Some("video")),
        AppShortcut::new("GitHub", "https://github.com", Some("code")),
    ]
}

/// `apps.json`
#[derive(Debug, Clone, Copy)]
pub struct Apps;

impl CollectionKind for Apps {
    type Item = AppShortcut;
    const FILE_NAME: &'static str = "apps.json";
    const TARGET: &'static str = "APPS";

    fn fallback() -> Vec<AppShortcut> {
        default_apps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let apps = default_apps();
        let names: Vec<_> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Gmail", "YouTube", "GitHub"]);
        assert_eq!(Apps::fallback(), apps);
    }

    #[test]
    fn test_missing_icon_falls_back() {
        let app: AppShortcut =
            serde_json::from_str(r#"{"name":"Docs","url":"https://docs.rs"}"#).unwrap();
        assert_eq!(app.icon_or_default(), DEFAULT_APP_ICON);
    }
}
