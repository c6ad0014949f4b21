//! Profile-scoped JSON collections: bookmarks, history, pinned tabs and apps.
//!
//! Each collection is one JSON array in the profile directory, read and
//! written whole through [`crate::atomic`]. A [`CollectionManager`] is
//! parameterised by a [`CollectionKind`] marker that names the file, the
//! retention cap and the fallback contents; kind-specific operations
//! (bookmark toggling, visit recording, CSV export) live in the sub-modules.
//!
//! Loading never fails the caller: a missing file yields the fallback and an
//! unreadable one is logged and degrades to the fallback as well. Use
//! [`CollectionManager::try_load`] to see the error instead. Read-modify-write
//! operations always go through `try_load`, so an unreadable file is never
//! replaced by the degraded contents.
//!
//! Writes need the profile directory to exist; only `default` is created on
//! demand.

pub mod apps;
pub mod bookmarks;
pub mod history;
pub mod pinned;
pub(crate) mod timestamp;

pub use apps::{AppShortcut, Apps};
pub use bookmarks::{Bookmark, Bookmarks};
pub use history::{History, HistoryAge, HistoryEntry, MAX_HISTORY_ENTRIES};
pub use pinned::{PinnedTab, PinnedTabs};

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use crate::atomic;
use crate::error::{Result, StoreError};
use crate::logging::LogHandle;
use crate::paths::AppPaths;
use crate::validation::{DEFAULT_PROFILE, profile_dir};

/// Static description of one collection.
pub trait CollectionKind {
    type Item: Serialize + DeserializeOwned + Clone + fmt::Debug;

    /// File name inside the profile directory.
    const FILE_NAME: &'static str;
    /// Log category.
    const TARGET: &'static str;
    /// Maximum number of items written on save. Items past the cap are
    /// dropped from the end.
    const CAP: Option<usize> = None;

    /// Contents used when the file is absent or unreadable.
    fn fallback() -> Vec<Self::Item> {
        Vec::new()
    }
}

/// Load/save/clear/delete operations for one collection kind.
pub struct CollectionManager<K: CollectionKind> {
    profiles_dir: PathBuf,
    log: LogHandle,
    _kind: PhantomData<fn() -> K>,
}

pub type BookmarkManager = CollectionManager<Bookmarks>;
pub type HistoryManager = CollectionManager<History>;
pub type PinnedTabManager = CollectionManager<PinnedTabs>;
pub type AppManager = CollectionManager<Apps>;

impl<K: CollectionKind> Clone for CollectionManager<K> {
    fn clone(&self) -> Self {
        Self {
            profiles_dir: self.profiles_dir.clone(),
            log: self.log.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: CollectionKind> fmt::Debug for CollectionManager<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionManager")
            .field("file", &K::FILE_NAME)
            .field("profiles_dir", &self.profiles_dir)
            .finish()
    }
}

impl<K: CollectionKind> CollectionManager<K> {
    pub fn new(paths: &AppPaths, log: LogHandle) -> Self {
        Self {
            profiles_dir: paths.profiles_dir(),
            log,
            _kind: PhantomData,
        }
    }

    /// Path of this collection's file for `profile`.
    pub fn path(&self, profile: &str) -> Result<PathBuf> {
        Ok(profile_dir(&self.profiles_dir, profile)?.join(K::FILE_NAME))
    }

    /// Load the collection, surfacing I/O and parse errors.
    ///
    /// A missing or blank file yields [`CollectionKind::fallback`].
    pub fn try_load(&self, profile: &str) -> Result<Vec<K::Item>> {
        let path = self.path(profile)?;
        Ok(atomic::read_json(&path)?.unwrap_or_else(K::fallback))
    }

    /// Load the collection, logging failures and degrading to the fallback.
    pub fn load(&self, profile: &str) -> Vec<K::Item> {
        self.load_or_fallback(profile).0
    }

    /// Like [`load`](Self::load), also returning `true` when the file was
    /// unreadable and the fallback was substituted.
    pub fn load_or_fallback(&self, profile: &str) -> (Vec<K::Item>, bool) {
        match self.try_load(profile) {
            Ok(items) => (items, false),
            Err(e) => {
                log_warn!(
                    self.log,
                    K::TARGET,
                    "Failed to load {} for profile '{}', using defaults: {}",
                    K::FILE_NAME,
                    profile,
                    e
                );
                (K::fallback(), true)
            }
        }
    }

    /// Path to write to. The profile directory must exist, except for
    /// `default`, which is created.
    fn writable_path(&self, profile: &str) -> Result<PathBuf> {
        let dir = profile_dir(&self.profiles_dir, profile)?;
        if !dir.is_dir() {
            if profile != DEFAULT_PROFILE {
                return Err(StoreError::NotFound(profile.to_string()));
            }
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(dir.join(K::FILE_NAME))
    }

    /// Atomically replace the collection, applying the retention cap.
    ///
    /// Fails with [`StoreError::NotFound`] if the profile does not exist.
    pub fn save(&self, profile: &str, items: &[K::Item]) -> Result<()> {
        let path = self.writable_path(profile)?;
        let kept = match K::CAP {
            Some(cap) if items.len() > cap => &items[..cap],
            _ => items,
        };
        atomic::write_json(&path, kept)?;
        log_debug!(
            self.log,
            K::TARGET,
            "Saved {} item(s) to {}",
            kept.len(),
            path.display()
        );
        Ok(())
    }

    /// Replace the collection with an empty one.
    pub fn clear(&self, profile: &str) -> Result<()> {
        self.save(profile, &[])?;
        log_info!(self.log, K::TARGET, "Cleared {} for profile '{}'", K::FILE_NAME, profile);
        Ok(())
    }

    /// Remove the items at `indices` and save. Returns what is left.
    ///
    /// Out-of-range and duplicate indices are ignored. An unreadable file is
    /// reported rather than overwritten.
    pub fn delete_by_indices(&self, profile: &str, indices: &[usize]) -> Result<Vec<K::Item>> {
        let mut items = self.try_load(profile)?;
        let removed = remove_indices(&mut items, indices);
        self.save(profile, &items)?;
        log_info!(
            self.log,
            K::TARGET,
            "Deleted {} item(s) from {} for profile '{}'",
            removed,
            K::FILE_NAME,
            profile
        );
        Ok(items)
    }
}

/// Remove the elements at `indices` from `items`, highest index first so that
/// earlier removals do not shift later ones. Returns the number removed.
pub fn remove_indices<T>(items: &mut Vec<T>, indices: &[usize]) -> usize {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();

    let mut removed = 0;
    for index in sorted {
        if index < items.len() {
            items.remove(index);
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_indices_descending() {
        let mut items = vec!["a", "b", "c"];
        assert_eq!(remove_indices(&mut items, &[0, 2]), 2);
        assert_eq!(items, vec!["b"]);
    }

    #[test]
    fn test_remove_indices_ignores_out_of_range_and_duplicates() {
        let mut items = vec![1, 2, 3, 4];
        assert_eq!(remove_indices(&mut items, &[1, 1, 9, 3]), 2);
        assert_eq!(items, vec![1, 3]);
    }

    #[test]
    fn test_remove_indices_unsorted_input() {
        let mut items = vec!['a', 'b', 'c', 'd', 'e'];
        remove_indices(&mut items, &[1, 4, 2]);
        assert_eq!(items, vec!['a', 'd']);
    }
}
