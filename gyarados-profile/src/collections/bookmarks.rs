//! Bookmarks, unique by URL.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{CollectionKind, CollectionManager, timestamp};
use crate::error::Result;

/// A saved page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
    /// When the bookmark was added, stored as `date` for compatibility with
    /// existing `bookmarks.json` files. Older entries may have no date.
    #[serde(rename = "date", default, with = "timestamp::optional")]
    pub date_added: Option<NaiveDateTime>,
}

impl Bookmark {
    /// A bookmark stamped with the current local time.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            date_added: Some(timestamp::now()),
        }
    }
}

/// `bookmarks.json`
#[derive(Debug, Clone, Copy)]
pub struct Bookmarks;

impl CollectionKind for Bookmarks {
    type Item = Bookmark;
    const FILE_NAME: &'static str = "bookmarks.json";
    const TARGET: &'static str = "BOOKMARKS";
}

/// Add a bookmark for `url`, or remove the existing one.
///
/// Returns `true` if `url` is bookmarked afterwards.
pub fn toggle(items: &mut Vec<Bookmark>, title: &str, url: &str) -> bool {
    match items.iter().position(|b| b.url == url) {
        Some(index) => {
            items.remove(index);
            false
        }
        None => {
            items.push(Bookmark::new(title, url));
            true
        }
    }
}

pub fn contains(items: &[Bookmark], url: &str) -> bool {
    items.iter().any(|b| b.url == url)
}

/// Case-insensitive match on title or URL. An empty query matches everything.
pub fn filter<'a>(items: &'a [Bookmark], query: &str) -> Vec<&'a Bookmark> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|b| {
            b.title.to_lowercase().contains(&needle) || b.url.to_lowercase().contains(&needle)
        })
        .collect()
}

impl CollectionManager<Bookmarks> {
    /// Toggle the bookmark for `url` in `profile` and save.
    ///
    /// Returns `true` if the page is bookmarked afterwards.
    pub fn toggle(&self, profile: &str, title: &str, url: &str) -> Result<bool> {
        let mut items = self.try_load(profile)?;
        let added = toggle(&mut items, title, url);
        self.save(profile, &items)?;
        log_info!(
            self.log,
            "BOOKMARKS",
            "{} bookmark {} in profile '{}'",
            if added { "Added" } else { "Removed" },
            url,
            profile
        );
        Ok(added)
    }

    /// Add a bookmark unless `url` is already bookmarked. Returns `true` if it
    /// was added.
    pub fn add(&self, profile: &str, title: &str, url: &str) -> Result<bool> {
        let mut items = self.try_load(profile)?;
        if contains(&items, url) {
            return Ok(false);
        }
        items.push(Bookmark::new(title, url));
        self.save(profile, &items)?;
        Ok(true)
    }

    pub fn contains(&self, profile: &str, url: &str) -> bool {
        contains(&self.load(profile), url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut items = vec![Bookmark::new("Rust", "https://rust-lang.org")];

        assert!(toggle(&mut items, "Docs", "https://docs.rs"));
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "Docs");

        assert!(!toggle(&mut items, "Docs", "https://docs.rs"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://rust-lang.org");
    }

    #[test]
    fn test_filter_matches_title_or_url_case_insensitively() {
        let items = vec![
            Bookmark::new("Rust Language", "https://rust-lang.org"),
            Bookmark::new("Crates", "https://crates.io"),
        ];
        assert_eq!(filter(&items, "rust").len(), 1);
        assert_eq!(filter(&items, "CRATES.IO").len(), 1);
        assert_eq!(filter(&items, "").len(), 2);
        assert!(filter(&items, "python").is_empty());
    }

    #[test]
    fn test_json_shape_uses_date_key() {
        let json = r#"[{"title":"Rust","url":"https://rust-lang.org","date":"2024-03-01 09:15:00"}]"#;
        let items: Vec<Bookmark> = serde_json::from_str(json).unwrap();
        let date = items[0].date_added.map(|t| timestamp::format(&t));
        assert_eq!(date.as_deref(), Some("2024-03-01 09:15:00"));

        let back = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(back["date"], "2024-03-01 09:15:00");
        assert!(back.get("date_added").is_none());
    }

    #[test]
    fn test_missing_or_blank_date_is_accepted() {
        let json = r#"[{"title":"Old","url":"https://old.example"},{"title":"Blank","url":"https://blank.example","date":""}]"#;
        let items: Vec<Bookmark> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|b| b.date_added.is_none()));

        let back = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(back["date"], "");
    }
}
