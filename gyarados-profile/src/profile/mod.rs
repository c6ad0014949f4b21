//! Profile discovery, creation, deletion and load/save.
//!
//! [`ProfileStore`] is the only writer to `profiles/<name>/`. A profile is
//! either plaintext (settings in the settings backend, scope
//! `"<app>/Browser/<name>"`) or encrypted (settings sealed in `config.enc`,
//! see [`envelope`]); the bookmark, history, pinned-tab and app collections
//! are JSON files in the profile directory in both cases.
//!
//! All operations run on the caller's thread and may block on disk I/O, on
//! PBKDF2, or on the password provider.

pub mod envelope;

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::collections::{
    AppManager, BookmarkManager, CollectionKind, CollectionManager, HistoryManager,
    PinnedTabManager,
};
use crate::config::Config;
use crate::crypto::{KeyDerivation, Salt, UnlockKey};
use crate::error::{Result, StoreError};
use crate::logging::LogHandle;
use crate::paths::{AppPaths, StoreOptions};
use crate::session::{self, SessionSnapshot};
use crate::settings::{FileSettings, SettingsBackend};
use crate::validation::{self, DEFAULT_PROFILE};

use envelope::ProfileKind;

/// What [`ProfileStore::save_profile`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Settings written to the settings backend.
    Plaintext,
    /// Settings re-encrypted with the key held from the unlock.
    Encrypted,
    /// Encrypted profile whose key is no longer held; nothing was written.
    SkippedLocked,
}

/// Owner of the on-disk profile layout.
pub struct ProfileStore {
    paths: AppPaths,
    options: StoreOptions,
    settings: Arc<dyn SettingsBackend>,
    log: LogHandle,
    bookmarks: BookmarkManager,
    history: HistoryManager,
    pinned_tabs: PinnedTabManager,
    apps: AppManager,
}

impl std::fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore")
            .field("paths", &self.paths)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ProfileStore {
    pub fn new(
        paths: AppPaths,
        options: StoreOptions,
        settings: Arc<dyn SettingsBackend>,
        log: LogHandle,
    ) -> Self {
        Self {
            bookmarks: BookmarkManager::new(&paths, log.clone()),
            history: HistoryManager::new(&paths, log.clone()),
            pinned_tabs: PinnedTabManager::new(&paths, log.clone()),
            apps: AppManager::new(&paths, log.clone()),
            paths,
            options,
            settings,
            log,
        }
    }

    /// Store under `paths` with YAML settings in `paths.settings_dir()` and
    /// default options.
    pub fn open(paths: AppPaths, log: LogHandle) -> Self {
        let settings = Arc::new(FileSettings::new(paths.settings_dir()));
        Self::new(paths, StoreOptions::default(), settings, log)
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn settings(&self) -> &dyn SettingsBackend {
        self.settings.as_ref()
    }

    pub fn log(&self) -> &LogHandle {
        &self.log
    }

    pub fn bookmarks(&self) -> &BookmarkManager {
        &self.bookmarks
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn pinned_tabs(&self) -> &PinnedTabManager {
        &self.pinned_tabs
    }

    pub fn apps(&self) -> &AppManager {
        &self.apps
    }

    /// Directory of profile `name`. Validates the name; the directory does
    /// not have to exist.
    pub fn profile_dir(&self, name: &str) -> Result<PathBuf> {
        validation::profile_dir(&self.paths.profiles_dir(), name)
    }

    fn existing_profile_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.profile_dir(name)?;
        if !dir.is_dir() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        validation::ensure_contained(&self.paths.profiles_dir(), &dir)?;
        Ok(dir)
    }

    fn scope(&self, name: &str) -> String {
        self.options.settings_scope(name)
    }

    fn kdf(&self) -> KeyDerivation {
        KeyDerivation::new(self.options.kdf_iterations)
    }

    // ── Discovery ──────────────────────────────────────────────────────────

    /// Create the `default` profile directory if it does not exist yet.
    pub fn ensure_default(&self) -> Result<()> {
        let dir = self.profile_dir(DEFAULT_PROFILE)?;
        if !dir.is_dir() {
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
            log_info!(self.log, "PROFILE", "Created default profile at {}", dir.display());
        }
        Ok(())
    }

    /// Names of all profiles, sorted. Always contains `default`.
    ///
    /// Entries of `profiles/` that are not directories or whose names are not
    /// valid profile names are skipped.
    pub fn list_profiles(&self) -> Result<Vec<String>> {
        self.ensure_default()?;
        let profiles_dir = self.paths.profiles_dir();
        let entries = fs::read_dir(&profiles_dir).map_err(|e| StoreError::io(&profiles_dir, e))?;

        let mut names = BTreeSet::from([DEFAULT_PROFILE.to_string()]);
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&profiles_dir, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                log_warn!(
                    self.log,
                    "PROFILE",
                    "Skipping profile directory with non UTF-8 name: {}",
                    entry.path().display()
                );
                continue;
            };
            if validation::validate_profile_name(&name).is_ok() {
                names.insert(name);
            }
        }
        Ok(names.into_iter().collect())
    }

    pub fn profile_exists(&self, name: &str) -> Result<bool> {
        Ok(self.profile_dir(name)?.is_dir())
    }

    /// True if `name` carries the encrypted-profile marker.
    pub fn is_encrypted(&self, name: &str) -> Result<bool> {
        let dir = self.profile_dir(name)?;
        Ok(envelope::read_kind(&dir)?.is_encrypted())
    }

    // ── Creation & deletion ────────────────────────────────────────────────

    /// Create profile `name`.
    ///
    /// With a password the profile is encrypted: a fresh salt is generated
    /// and default settings are sealed with the derived key. Without one the
    /// profile starts as a copy of `default`'s settings, bookmarks, pinned
    /// tabs and apps.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if the directory exists.
    /// A failed creation removes whatever it had written.
    pub fn create_profile(&self, name: &str, password: Option<&str>) -> Result<Config> {
        let dir = self.profile_dir(name)?;
        if password.is_some_and(str::is_empty) {
            return Err(StoreError::Policy("password must not be empty".to_string()));
        }

        let profiles_dir = self.paths.profiles_dir();
        fs::create_dir_all(&profiles_dir).map_err(|e| StoreError::io(&profiles_dir, e))?;
        match fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(name.to_string()));
            }
            Err(e) => return Err(StoreError::io(&dir, e)),
        }

        let result = match password {
            Some(password) => self.create_encrypted(name, password),
            None => self.create_plaintext(name),
        };

        match result {
            Ok(config) => {
                log_info!(
                    self.log,
                    "PROFILE",
                    "Created {} profile '{}'",
                    if config.is_encrypted() { "encrypted" } else { "plaintext" },
                    name
                );
                Ok(config)
            }
            Err(e) => {
                log_error!(self.log, "PROFILE", "Failed to create profile '{}': {}", name, e);
                let _ = self.settings.remove_scope(&self.scope(name));
                if let Err(cleanup) = fs::remove_dir_all(&dir) {
                    log_warn!(
                        self.log,
                        "PROFILE",
                        "Could not remove partial profile {}: {}",
                        dir.display(),
                        cleanup
                    );
                }
                Err(e)
            }
        }
    }

    fn create_encrypted(&self, name: &str, password: &str) -> Result<Config> {
        let dir = self.profile_dir(name)?;
        let salt = Salt::generate();
        let key = UnlockKey::new(self.kdf().derive(password.as_bytes(), &salt));

        let mut config = Config::for_profile(name);
        let token = envelope::seal(&config, &key)?;
        self.write_collections(&config)?;
        envelope::write_envelope(&dir, &salt, &token)?;

        config.encrypted = true;
        config.unlock_key = Some(key);
        Ok(config)
    }

    fn create_plaintext(&self, name: &str) -> Result<Config> {
        let mut config = if name == DEFAULT_PROFILE {
            Config::default()
        } else {
            self.default_seed()
        };
        config.current_profile = name.to_string();
        config.encrypted = false;
        config.unlock_key = None;

        self.write_plaintext(&config)?;
        Ok(config)
    }

    /// Settings and collections of `default`, used to seed new plaintext
    /// profiles. An encrypted or unreadable `default` seeds built-in defaults.
    fn default_seed(&self) -> Config {
        let seed = self.is_encrypted(DEFAULT_PROFILE).and_then(|encrypted| {
            if encrypted {
                return Ok(Config::default());
            }
            let mut config = self.load_plaintext(DEFAULT_PROFILE)?;
            config.bookmarks = self.bookmarks.load(DEFAULT_PROFILE);
            config.pinned_tabs = self.pinned_tabs.load(DEFAULT_PROFILE);
            config.apps = self.apps.load(DEFAULT_PROFILE);
            Ok(config)
        });
        match seed {
            Ok(config) => config,
            Err(e) => {
                log_warn!(
                    self.log,
                    "PROFILE",
                    "Could not read default profile, seeding from built-in defaults: {}",
                    e
                );
                Config::default()
            }
        }
    }

    /// Remove profile `name` and everything it stores. Irreversible.
    ///
    /// `default` cannot be deleted.
    pub fn delete_profile(&self, name: &str) -> Result<()> {
        validation::validate_profile_name(name)?;
        if name == DEFAULT_PROFILE {
            return Err(StoreError::Policy(
                "the default profile cannot be deleted".to_string(),
            ));
        }
        let dir = self.existing_profile_dir(name)?;

        fs::remove_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        self.settings.remove_scope(&self.scope(name))?;
        log_info!(self.log, "PROFILE", "Deleted profile '{}'", name);
        Ok(())
    }

    // ── Load & save ────────────────────────────────────────────────────────

    /// Load profile `name`.
    ///
    /// For an encrypted profile `password_provider` is called with the
    /// profile name to obtain the password; returning `None` aborts with
    /// [`StoreError::PasswordRequired`]. A wrong password yields
    /// [`StoreError::Authentication`], so the caller can ask again.
    ///
    /// Collections that cannot be read are logged and come back as their
    /// defaults; they are listed in [`Config::unreadable_collections()`] and
    /// are not written back by [`save_profile`](Self::save_profile).
    /// Settings that cannot be read are an error.
    pub fn load_profile<F>(&self, name: &str, password_provider: F) -> Result<Config>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        if name == DEFAULT_PROFILE {
            self.ensure_default()?;
        }
        let dir = self.existing_profile_dir(name)?;

        let mut config = match envelope::read_kind(&dir)? {
            ProfileKind::Plaintext => self.load_plaintext(name)?,
            ProfileKind::Encrypted(salt) => {
                let password = password_provider(name)
                    .map(Zeroizing::new)
                    .ok_or_else(|| StoreError::PasswordRequired(name.to_string()))?;
                let key = UnlockKey::new(self.kdf().derive(password.as_bytes(), &salt));
                let token = envelope::read_token(&dir)?;
                let mut config = envelope::unseal(&token, &key).inspect_err(|e| {
                    if e.is_authentication() {
                        log_warn!(self.log, "PROFILE", "Wrong password for profile '{}'", name);
                    }
                })?;
                config.encrypted = true;
                config.unlock_key = Some(key);
                config
            }
        };

        config.current_profile = name.to_string();
        self.load_collections(&mut config);

        log_info!(
            self.log,
            "PROFILE",
            "Loaded {} profile '{}' ({} bookmarks)",
            if config.is_encrypted() { "encrypted" } else { "plaintext" },
            name,
            config.bookmarks.len()
        );
        Ok(config)
    }

    fn load_collections(&self, config: &mut Config) {
        let name = config.current_profile.clone();
        let unreadable = &mut config.unreadable_collections;
        unreadable.clear();
        config.bookmarks = load_tracked(&self.bookmarks, &name, unreadable);
        config.pinned_tabs = load_tracked(&self.pinned_tabs, &name, unreadable);
        config.apps = load_tracked(&self.apps, &name, unreadable);
    }

    fn load_plaintext(&self, name: &str) -> Result<Config> {
        let mut config = Config::from_settings(self.settings.entries(&self.scope(name))?)?;
        config.current_profile = name.to_string();
        Ok(config)
    }

    /// Persist `config` under the profile it names.
    ///
    /// Plaintext profiles write their settings and collections. Encrypted
    /// profiles are re-encrypted with the key held since they were unlocked;
    /// if that key has been dropped the save is skipped.
    ///
    /// Refuses to write a plaintext config over an encrypted profile and vice
    /// versa.
    pub fn save_profile(&self, config: &Config) -> Result<SaveOutcome> {
        let name = config.profile_name();
        let dir = self.existing_profile_dir(name)?;

        let on_disk = envelope::read_kind(&dir)?;
        if on_disk.is_encrypted() != config.is_encrypted() {
            return Err(StoreError::Policy(format!(
                "profile '{}' is {} on disk but the config to save is {}",
                name,
                if on_disk.is_encrypted() { "encrypted" } else { "plaintext" },
                if config.is_encrypted() { "encrypted" } else { "plaintext" },
            )));
        }

        if !config.is_encrypted() {
            self.write_plaintext(config)?;
            log_debug!(self.log, "PROFILE", "Saved plaintext profile '{}'", name);
            return Ok(SaveOutcome::Plaintext);
        }

        let Some(key) = &config.unlock_key else {
            log_info!(
                self.log,
                "PROFILE",
                "Not saving encrypted profile '{}': it is locked",
                name
            );
            return Ok(SaveOutcome::SkippedLocked);
        };
        let token = envelope::seal(config, key)?;
        self.write_collections(config)?;
        envelope::write_token(&dir, &token)?;
        log_debug!(self.log, "PROFILE", "Re-encrypted profile '{}'", name);
        Ok(SaveOutcome::Encrypted)
    }

    fn write_plaintext(&self, config: &Config) -> Result<()> {
        self.settings
            .set_many(&self.scope(config.profile_name()), config.to_settings()?)?;
        self.write_collections(config)
    }

    fn write_collections(&self, config: &Config) -> Result<()> {
        let name = config.profile_name();
        self.save_tracked(&self.bookmarks, config, &config.bookmarks)?;
        self.save_tracked(&self.pinned_tabs, config, &config.pinned_tabs)?;
        self.save_tracked(&self.apps, config, &config.apps)?;
        if !self.history.path(name)?.exists() {
            self.history.save(name, &[])?;
        }
        Ok(())
    }

    /// Save one collection of `config` unless it failed to load.
    fn save_tracked<K: CollectionKind>(
        &self,
        manager: &CollectionManager<K>,
        config: &Config,
        items: &[K::Item],
    ) -> Result<()> {
        if config.unreadable_collections.contains(K::FILE_NAME) {
            log_warn!(
                self.log,
                "PROFILE",
                "Leaving {} of profile '{}' untouched: it could not be read",
                K::FILE_NAME,
                config.profile_name()
            );
            return Ok(());
        }
        manager.save(config.profile_name(), items)
    }

    /// Save `from`, then load `to`.
    ///
    /// If saving `from` fails nothing is loaded and the error is returned.
    pub fn switch_profile<F>(&self, from: &Config, to: &str, password_provider: F) -> Result<Config>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        self.save_profile(from)?;
        let config = self.load_profile(to, password_provider)?;
        log_info!(
            self.log,
            "PROFILE",
            "Switched from '{}' to '{}'",
            from.profile_name(),
            to
        );
        Ok(config)
    }

    /// Re-key encrypted profile `name`.
    ///
    /// `old` must unlock the profile ([`StoreError::Authentication`]
    /// otherwise). The profile keeps its salt, so only `config.enc` is
    /// replaced and an interrupted change leaves the old password working.
    /// Returns the unlocked config under the new key.
    pub fn change_password(&self, name: &str, old: &str, new: &str) -> Result<Config> {
        if new.is_empty() {
            return Err(StoreError::Policy("password must not be empty".to_string()));
        }
        let dir = self.existing_profile_dir(name)?;
        let ProfileKind::Encrypted(salt) = envelope::read_kind(&dir)? else {
            return Err(StoreError::Policy(format!(
                "profile '{name}' is not encrypted"
            )));
        };

        let old_key = UnlockKey::new(self.kdf().derive(old.as_bytes(), &salt));
        let mut config = envelope::unseal(&envelope::read_token(&dir)?, &old_key)?;
        config.current_profile = name.to_string();

        let key = UnlockKey::new(self.kdf().derive(new.as_bytes(), &salt));
        let token = envelope::seal(&config, &key)?;
        envelope::write_token(&dir, &token)?;

        config.encrypted = true;
        config.unlock_key = Some(key);
        self.load_collections(&mut config);
        log_info!(self.log, "PROFILE", "Changed password of profile '{}'", name);
        Ok(config)
    }

    // ── Session ────────────────────────────────────────────────────────────

    /// Save the session of `config`'s profile. Skipped (returning `false`)
    /// when `SAVE_SESSION` is off.
    pub fn save_session(&self, config: &Config, snapshot: &SessionSnapshot) -> Result<bool> {
        if !config.save_session {
            log_debug!(
                self.log,
                "SESSION",
                "Session saving disabled for '{}'",
                config.profile_name()
            );
            return Ok(false);
        }
        validation::validate_profile_name(config.profile_name())?;
        session::storage::save_session(
            self.settings.as_ref(),
            &self.scope(config.profile_name()),
            snapshot,
        )?;
        log_info!(
            self.log,
            "SESSION",
            "Saved session ({} tabs) for '{}'",
            snapshot.tabs.len(),
            config.profile_name()
        );
        Ok(true)
    }

    /// Saved session of profile `name`. An unreadable session is logged and
    /// treated as no session.
    pub fn load_session(&self, name: &str) -> Result<Option<SessionSnapshot>> {
        validation::validate_profile_name(name)?;
        match session::storage::load_session(self.settings.as_ref(), &self.scope(name)) {
            Ok(snapshot) => Ok(snapshot),
            Err(e @ (StoreError::Json(_) | StoreError::Yaml(_))) => {
                log_warn!(
                    self.log,
                    "SESSION",
                    "Ignoring unreadable session of '{}': {}",
                    name,
                    e
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn clear_session(&self, name: &str) -> Result<()> {
        validation::validate_profile_name(name)?;
        session::storage::clear_session(self.settings.as_ref(), &self.scope(name))
    }
}

/// Load one collection, noting its file name in `unreadable` if it had to be
/// replaced by the fallback.
fn load_tracked<K: CollectionKind>(
    manager: &CollectionManager<K>,
    profile: &str,
    unreadable: &mut BTreeSet<&'static str>,
) -> Vec<K::Item> {
    let (items, failed) = manager.load_or_fallback(profile);
    if failed {
        unreadable.insert(K::FILE_NAME);
    }
    items
}
