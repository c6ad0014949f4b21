//! Key-value settings storage, grouped into named scopes.
//!
//! Each profile's plaintext settings and its session blob live in the scope
//! `"<app>/Browser/<profile>"`. [`FileSettings`] keeps one YAML document per
//! scope; [`MemorySettings`] keeps everything in a map, which is handy for
//! tests and for hosts that persist settings themselves.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::atomic;
use crate::error::{Result, StoreError};

/// A scoped key-value store.
pub trait SettingsBackend: Send + Sync {
    /// Value of `key` in `scope`, if set.
    fn get(&self, scope: &str, key: &str) -> Result<Option<Value>>;

    /// Every key/value pair of `scope`. Empty when the scope does not exist.
    fn entries(&self, scope: &str) -> Result<Map<String, Value>>;

    fn set(&self, scope: &str, key: &str, value: Value) -> Result<()> {
        self.set_many(scope, Map::from_iter([(key.to_string(), value)]))
    }

    /// Set several keys at once. File-backed implementations write the scope
    /// once.
    fn set_many(&self, scope: &str, values: Map<String, Value>) -> Result<()>;

    /// Remove `key` from `scope`. Removing an absent key is not an error.
    fn remove(&self, scope: &str, key: &str) -> Result<()>;

    /// Drop the whole scope.
    fn remove_scope(&self, scope: &str) -> Result<()>;
}

/// One YAML file per scope under a base directory
/// (`<base>/<app>/Browser/<profile>.yaml`).
#[derive(Debug, Clone)]
pub struct FileSettings {
    base: PathBuf,
}

impl FileSettings {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// File holding `scope`.
    ///
    /// Scope segments must be plain names; anything that could climb out of
    /// the base directory is refused.
    pub fn scope_path(&self, scope: &str) -> Result<PathBuf> {
        let relative = Path::new(scope);
        let plain = !scope.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(StoreError::Policy(format!(
                "settings scope '{scope}' is not a relative path of plain names"
            )));
        }
        let mut path = self.base.join(relative);
        let mut file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        file_name.push(".yaml");
        path.set_file_name(file_name);
        Ok(path)
    }

    fn read_scope(&self, path: &Path) -> Result<Map<String, Value>> {
        let Some(bytes) = atomic::read_bytes(path)? else {
            return Ok(Map::new());
        };
        let text = String::from_utf8_lossy(&bytes);
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_yaml_ng::from_str(&text)?)
    }

    fn write_scope(&self, path: &Path, map: &Map<String, Value>) -> Result<()> {
        let yaml = serde_yaml_ng::to_string(map)?;
        atomic::write_bytes(path, yaml.as_bytes())
    }
}

impl SettingsBackend for FileSettings {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Value>> {
        let path = self.scope_path(scope)?;
        Ok(self.read_scope(&path)?.remove(key))
    }

    fn entries(&self, scope: &str) -> Result<Map<String, Value>> {
        let path = self.scope_path(scope)?;
        self.read_scope(&path)
    }

    fn set_many(&self, scope: &str, values: Map<String, Value>) -> Result<()> {
        let path = self.scope_path(scope)?;
        let mut map = self.read_scope(&path)?;
        map.extend(values);
        self.write_scope(&path, &map)
    }

    fn remove(&self, scope: &str, key: &str) -> Result<()> {
        let path = self.scope_path(scope)?;
        let mut map = self.read_scope(&path)?;
        if map.remove(key).is_some() {
            self.write_scope(&path, &map)?;
        }
        Ok(())
    }

    fn remove_scope(&self, scope: &str) -> Result<()> {
        let path = self.scope_path(scope)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}

/// In-process settings.
#[derive(Debug, Default)]
pub struct MemorySettings {
    scopes: Mutex<HashMap<String, Map<String, Value>>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the scopes currently holding at least one key.
    pub fn scopes(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scopes
            .lock()
            .iter()
            .filter(|(_, map)| !map.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

impl SettingsBackend for MemorySettings {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Value>> {
        Ok(self
            .scopes
            .lock()
            .get(scope)
            .and_then(|map| map.get(key))
            .cloned())
    }

    fn entries(&self, scope: &str) -> Result<Map<String, Value>> {
        Ok(self.scopes.lock().get(scope).cloned().unwrap_or_default())
    }

    fn set_many(&self, scope: &str, values: Map<String, Value>) -> Result<()> {
        self.scopes
            .lock()
            .entry(scope.to_string())
            .or_default()
            .extend(values);
        Ok(())
    }

    fn remove(&self, scope: &str, key: &str) -> Result<()> {
        if let Some(map) = self.scopes.lock().get_mut(scope) {
            map.remove(key);
        }
        Ok(())
    }

    fn remove_scope(&self, scope: &str) -> Result<()> {
        self.scopes.lock().remove(scope);
        Ok(())
    }
}
