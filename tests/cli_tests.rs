//! Drive the CLI end to end against a temporary data directory.

use clap::Parser;
use gyarados::cli::{self, Cli};
use gyarados::profile::{
    AppPaths, FileSettings, LogHandle, ProfileStore, SessionSnapshot, SessionTab, StoreOptions,
};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

fn store_in(temp: &TempDir) -> ProfileStore {
    let paths = AppPaths::new(temp.path());
    let settings = Arc::new(FileSettings::new(paths.settings_dir()));
    let options = StoreOptions {
        kdf_iterations: 1_000,
        ..StoreOptions::default()
    };
    ProfileStore::new(paths, options, settings, LogHandle::discard())
}

/// Run one command line with `input` as stdin and return stdout.
fn run(store: &ProfileStore, args: &[&str], input: &str) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("gyarados").chain(args.iter().copied()))?;
    let mut out = Vec::new();
    cli::run(cli, store, &LogHandle::discard(), &mut Cursor::new(input), &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_profiles_list_marks_encrypted() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);
    run(&store, &["profiles", "create", "work"], "").unwrap();
    run(&store, &["profiles", "create", "vault", "--encrypt"], "pw\npw\n").unwrap();

    let out = run(&store, &["profiles", "list"], "").unwrap();
    assert_eq!(out, "default\nvault (encrypted)\nwork\n");
}

#[test]
fn test_create_encrypted_rejects_mismatched_passwords() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);

    let err = run(&store, &["profiles", "create", "vault", "-e"], "one\ntwo\n").unwrap_err();
    assert!(format!("{err:#}").contains("do not match"));
    assert!(!store.profile_exists("vault").unwrap());
}

#[test]
fn test_show_retries_wrong_password() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);
    store.create_profile("vault", Some("right")).unwrap();

    let out = run(&store, &["profiles", "show", "vault"], "wrong\nright\n").unwrap();
    assert!(out.contains("Wrong password, try again."));
    assert!(out.contains("Encrypted:       yes"));
}

#[test]
fn test_show_gives_up_after_three_wrong_passwords() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);
    store.create_profile("vault", Some("right")).unwrap();

    let err = run(&store, &["profiles", "show", "vault"], "a\nb\nc\nright\n").unwrap_err();
    let root = err.root_cause().to_string();
    assert!(root.contains("authentication failed"), "{root}");
}

#[test]
fn test_delete_asks_for_confirmation() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);
    store.create_profile("work", None).unwrap();

    let out = run(&store, &["profiles", "delete", "work"], "n\n").unwrap();
    assert!(out.contains("Deletion cancelled."));
    assert!(store.profile_exists("work").unwrap());

    run(&store, &["profiles", "delete", "work"], "y\n").unwrap();
    assert!(!store.profile_exists("work").unwrap());
}

#[test]
fn test_default_profile_delete_is_refused() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);
    store.list_profiles().unwrap();

    assert!(run(&store, &["profiles", "delete", "default", "--yes"], "").is_err());
    assert!(store.profile_exists("default").unwrap());
}

#[test]
fn test_bookmark_commands() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);

    let out = run(&store, &["bookmarks", "toggle", "https://docs.rs", "-t", "Docs"], "").unwrap();
    assert_eq!(out, "Bookmarked https://docs.rs\n");
    run(&store, &["bookmarks", "toggle", "https://crates.io"], "").unwrap();

    let out = run(&store, &["bookmarks", "list", "--filter", "DOCS"], "").unwrap();
    assert_eq!(out, "  0  Docs  https://docs.rs\n");

    let out = run(&store, &["bookmarks", "delete", "0"], "").unwrap();
    assert_eq!(out, "1 bookmark(s) left\n");

    let out = run(&store, &["bookmarks", "toggle", "https://crates.io"], "").unwrap();
    assert_eq!(out, "Removed bookmark https://crates.io\n");
}

#[test]
fn test_history_export_and_clear() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);
    store
        .history()
        .record_visit("default", "https://example.org", "Example")
        .unwrap();

    let out = run(&store, &["history", "list", "--age", "today"], "").unwrap();
    assert!(out.contains("Example  https://example.org"));

    let dest = temp.path().join("history.csv");
    let out = run(&store, &["history", "export", dest.to_str().unwrap()], "").unwrap();
    assert!(out.starts_with("Exported 1 entries"));
    assert!(std::fs::read_to_string(&dest).unwrap().starts_with("Date,Title,URL\n"));

    run(&store, &["history", "clear"], "no\n").unwrap();
    assert_eq!(store.history().load("default").len(), 1);
    run(&store, &["history", "clear", "-y"], "").unwrap();
    assert!(store.history().load("default").is_empty());
}

#[test]
fn test_session_show_marks_current_tab() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);
    let config = store.load_profile("default", |_| None).unwrap();
    let tab = |url: &str, pinned: bool| SessionTab {
        url: url.to_string(),
        private: false,
        custom_title: None,
        pinned,
    };
    let snapshot = SessionSnapshot {
        tabs: vec![tab("https://a.example", true), tab("https://b.example", false)],
        current_index: 1,
        dark_theme: false,
    };
    store.save_session(&config, &snapshot).unwrap();

    let out = run(&store, &["session", "show"], "").unwrap();
    assert_eq!(
        out,
        "  https://a.example  https://a.example  [pinned]\n* https://b.example  https://b.example\n"
    );

    run(&store, &["session", "clear"], "").unwrap();
    assert_eq!(run(&store, &["session", "show"], "").unwrap(), "No saved session\n");
}

#[test]
fn test_launch_reports_restore_plan() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);
    store.create_profile("vault", Some("pw")).unwrap();

    let out = run(&store, &["--profile", "vault"], "pw\n").unwrap();
    assert!(out.contains("Profile 'vault' ready (0 bookmarks, 1 of 1 plugins active)"));
    assert!(out.contains("Home page: https://duckduckgo.com"));
}

#[test]
fn test_plugins_json() {
    let temp = tempdir().unwrap();
    let store = store_in(&temp);

    let out = run(&store, &["plugins", "--json"], "").unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value[0]["name"], "auto-switch");
    assert_eq!(value[0]["active"], false);
}
