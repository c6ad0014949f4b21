//! Collection files through the public managers.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use gyarados_profile::atomic;
use gyarados_profile::collections::MAX_HISTORY_ENTRIES;
use gyarados_profile::{
    AppManager, AppPaths, Bookmark, BookmarkManager, HistoryManager, LogHandle, PinnedTab,
    PinnedTabManager,
};
use tempfile::{TempDir, tempdir};

fn paths(temp: &TempDir) -> AppPaths {
    AppPaths::new(temp.path())
}

fn at(minute: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap()
        + Duration::minutes(minute)
}

#[test]
fn test_history_retains_most_recent_hundred() {
    let temp = tempdir().unwrap();
    let history = HistoryManager::new(&paths(&temp), LogHandle::discard());

    for i in 0..=MAX_HISTORY_ENTRIES as i64 {
        history
            .record_visit_at("default", &format!("https://site{i}.example"), "Site", at(i))
            .unwrap();
    }

    let entries = history.load("default");
    assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
    assert_eq!(entries[0].url, "https://site100.example");
    assert!(!entries.iter().any(|e| e.url == "https://site0.example"));
}

#[test]
fn test_history_repeat_visit_updates_in_place() {
    let temp = tempdir().unwrap();
    let history = HistoryManager::new(&paths(&temp), LogHandle::discard());

    history.record_visit_at("default", "https://a.example", "A", at(0)).unwrap();
    history.record_visit_at("default", "https://b.example", "B", at(1)).unwrap();
    history.record_visit_at("default", "https://a.example", "A again", at(2)).unwrap();

    let entries = history.load("default");
    assert_eq!(entries.len(), 2);
    let a = entries.iter().find(|e| e.url == "https://a.example").unwrap();
    assert_eq!(a.title, "A again");
    assert_eq!(a.time, at(2));
}

#[test]
fn test_history_file_format() {
    let temp = tempdir().unwrap();
    let history = HistoryManager::new(&paths(&temp), LogHandle::discard());
    history.record_visit_at("default", "https://a.example", "A", at(0)).unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&std::fs::read(history.path("default").unwrap()).unwrap()).unwrap();
    assert_eq!(raw[0]["time"], "2025-03-14 09:00:00");
    assert_eq!(raw[0]["url"], "https://a.example");
    assert_eq!(raw[0]["title"], "A");
}

#[test]
fn test_history_export_csv() {
    let temp = tempdir().unwrap();
    let history = HistoryManager::new(&paths(&temp), LogHandle::discard());
    history
        .record_visit_at("default", "https://q.example/?a=1", "Say \"hi\", world", at(0))
        .unwrap();

    let dest = temp.path().join("export/history.csv");
    assert_eq!(history.export_csv("default", &dest).unwrap(), 1);

    let csv = std::fs::read_to_string(dest).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("Date,Title,URL"));
    assert_eq!(
        lines.next(),
        Some("\"2025-03-14 09:00:00\",\"Say \"\"hi\"\", world\",\"https://q.example/?a=1\"")
    );
}

#[test]
fn test_bookmark_toggle_twice_restores_collection() {
    let temp = tempdir().unwrap();
    let bookmarks = BookmarkManager::new(&paths(&temp), LogHandle::discard());
    bookmarks.add("default", "Rust", "https://rust-lang.org").unwrap();
    let before = bookmarks.load("default");

    assert!(bookmarks.toggle("default", "Docs", "https://docs.rs").unwrap());
    assert!(bookmarks.contains("default", "https://docs.rs"));
    assert!(!bookmarks.toggle("default", "Docs", "https://docs.rs").unwrap());

    assert_eq!(bookmarks.load("default"), before);
}

#[test]
fn test_delete_by_indices_keeps_the_rest_in_order() {
    let temp = tempdir().unwrap();
    let bookmarks = BookmarkManager::new(&paths(&temp), LogHandle::discard());
    let items = vec![
        Bookmark::new("A", "https://a.example"),
        Bookmark::new("B", "https://b.example"),
        Bookmark::new("C", "https://c.example"),
    ];
    bookmarks.save("default", &items).unwrap();

    let left = bookmarks.delete_by_indices("default", &[0, 2]).unwrap();
    assert_eq!(left, vec![items[1].clone()]);
    assert_eq!(bookmarks.load("default"), left);
}

#[test]
fn test_corrupt_collection_degrades_but_is_not_overwritten() {
    let temp = tempdir().unwrap();
    let bookmarks = BookmarkManager::new(&paths(&temp), LogHandle::discard());
    let path = bookmarks.path("default").unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[{\"title\": ").unwrap();

    assert!(bookmarks.load("default").is_empty());
    assert!(bookmarks.try_load("default").is_err());
    assert!(bookmarks.delete_by_indices("default", &[0]).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{\"title\": ");
}

#[test]
fn test_visit_does_not_replace_unreadable_history() {
    let temp = tempdir().unwrap();
    let history = HistoryManager::new(&paths(&temp), LogHandle::discard());
    let path = history.path("default").unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "[{\"time\": 3}]").unwrap();

    assert!(history.record_visit_at("default", "https://a.example", "A", at(0)).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{\"time\": 3}]");
}

#[test]
fn test_missing_apps_fall_back_to_defaults() {
    let temp = tempdir().unwrap();
    let apps = AppManager::new(&paths(&temp), LogHandle::discard());

    let loaded = apps.load("default");
    let names: Vec<_> = loaded.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["Gmail", "YouTube", "GitHub"]);

    apps.clear("default").unwrap();
    assert!(apps.load("default").is_empty());
}

#[test]
fn test_pinned_tabs_accept_legacy_name_key() {
    let temp = tempdir().unwrap();
    let pinned = PinnedTabManager::new(&paths(&temp), LogHandle::discard());
    let path = pinned.path("default").unwrap();
    atomic::write_bytes(
        &path,
        br#"[{"name": "Mail", "url": "https://mail.example"}]"#,
    )
    .unwrap();

    let tabs = pinned.load("default");
    assert_eq!(
        tabs,
        vec![PinnedTab {
            title: "Mail".into(),
            url: "https://mail.example".into(),
            icon: None,
        }]
    );
}

#[test]
fn test_collections_are_per_profile() {
    let temp = tempdir().unwrap();
    let bookmarks = BookmarkManager::new(&paths(&temp), LogHandle::discard());
    std::fs::create_dir_all(paths(&temp).profiles_dir().join("a")).unwrap();
    bookmarks.add("a", "A", "https://a.example").unwrap();

    assert_eq!(bookmarks.load("a").len(), 1);
    assert!(bookmarks.load("b").is_empty());
    assert!(bookmarks.path("../b").is_err());
}

#[test]
fn test_interrupted_write_leaves_previous_file() {
    let temp = tempdir().unwrap();
    let bookmarks = BookmarkManager::new(&paths(&temp), LogHandle::discard());
    bookmarks.add("default", "A", "https://a.example").unwrap();
    let path = bookmarks.path("default").unwrap();
    let before = std::fs::read(&path).unwrap();

    let staged = atomic::stage(&path, b"[]").unwrap();
    assert!(staged.temp_path().exists());
    drop(staged);

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert!(!atomic::temp_path_for(&path).exists());
}
