//! Statically registered browser plugins.
//!
//! A plugin is a value implementing [`Plugin`]. The host registers its
//! plugins with a [`PluginRegistry`] once a profile is open, activates them
//! all, and lets the user toggle them individually. A plugin that fails to
//! activate is logged and stays inactive; it never aborts startup.

use anyhow::{Context, Result, bail};
use gyarados_profile::{Config, LogHandle, ProfileStore, log_error, log_info, log_warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Descriptive fields shown in the plugin manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginMetadata {
    pub name: String,
    pub description: String,
    pub author: String,
    pub version: String,
}

impl PluginMetadata {
    /// Metadata with the placeholder description, author and version.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "No description".to_string(),
            author: "Unknown".to_string(),
            version: "1.0".to_string(),
        }
    }
}

/// What a plugin sees while it is being activated or deactivated.
pub struct PluginContext<'a> {
    pub config: &'a Config,
    pub store: &'a ProfileStore,
    pub log: &'a LogHandle,
}

/// Capability interface every plugin implements.
pub trait Plugin: Send {
    fn metadata(&self) -> PluginMetadata;

    fn activate(&mut self, ctx: &PluginContext<'_>) -> Result<()>;

    fn deactivate(&mut self, _ctx: &PluginContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Row of [`PluginRegistry::info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    #[serde(flatten)]
    pub metadata: PluginMetadata,
    pub active: bool,
}

struct Entry {
    plugin: Box<dyn Plugin>,
    metadata: PluginMetadata,
    active: bool,
}

/// Registered plugins, in registration order.
pub struct PluginRegistry {
    entries: Vec<Entry>,
    log: LogHandle,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.entries.iter().map(|e| &e.metadata.name).collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new(log: LogHandle) -> Self {
        Self {
            entries: Vec::new(),
            log,
        }
    }

    /// Add `plugin` in the inactive state. Names must be unique.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<()> {
        let metadata = plugin.metadata();
        if metadata.name.trim().is_empty() {
            bail!("plugin name must not be empty");
        }
        if self.entries.iter().any(|e| e.metadata.name == metadata.name) {
            bail!("plugin '{}' is already registered", metadata.name);
        }
        log_info!(
            self.log,
            "PLUGIN",
            "Loaded plugin: {} v{}",
            metadata.name,
            metadata.version
        );
        self.entries.push(Entry {
            plugin,
            metadata,
            active: false,
        });
        Ok(())
    }

    /// Activate every inactive plugin. Returns how many are active afterwards.
    pub fn activate_all(&mut self, ctx: &PluginContext<'_>) -> usize {
        for entry in self.entries.iter_mut().filter(|e| !e.active) {
            match entry.plugin.activate(ctx) {
                Ok(()) => {
                    entry.active = true;
                    log_info!(self.log, "PLUGIN", "Activated plugin: {}", entry.metadata.name);
                }
                Err(e) => {
                    log_error!(
                        self.log,
                        "PLUGIN",
                        "Plugin {} activation failed: {:#}",
                        entry.metadata.name,
                        e
                    );
                }
            }
        }
        self.active_count()
    }

    /// Deactivate every active plugin, last registered first.
    pub fn deactivate_all(&mut self, ctx: &PluginContext<'_>) {
        for entry in self.entries.iter_mut().rev().filter(|e| e.active) {
            if let Err(e) = entry.plugin.deactivate(ctx) {
                log_warn!(
                    self.log,
                    "PLUGIN",
                    "Plugin {} did not deactivate cleanly: {:#}",
                    entry.metadata.name,
                    e
                );
            }
            entry.active = false;
        }
    }

    /// Flip plugin `name` between active and inactive. Returns the new state.
    ///
    /// On failure the plugin keeps its previous state.
    pub fn toggle(&mut self, name: &str, ctx: &PluginContext<'_>) -> Result<bool> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.metadata.name == name) else {
            bail!("no plugin named '{name}'");
        };

        if entry.active {
            entry
                .plugin
                .deactivate(ctx)
                .with_context(|| format!("failed to deactivate plugin '{name}'"))?;
            entry.active = false;
            log_info!(self.log, "PLUGIN", "Deactivated plugin: {}", name);
        } else {
            entry
                .plugin
                .activate(ctx)
                .with_context(|| format!("failed to activate plugin '{name}'"))?;
            entry.active = true;
            log_info!(self.log, "PLUGIN", "Reactivated plugin: {}", name);
        }
        Ok(entry.active)
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.active && e.metadata.name == name)
    }

    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|e| e.active).count()
    }

    pub fn info(&self) -> Vec<PluginInfo> {
        self.entries
            .iter()
            .map(|e| PluginInfo {
                metadata: e.metadata.clone(),
                active: e.active,
            })
            .collect()
    }
}

/// Routes sites to profiles using the `AUTO_SWITCH_PROFILES` setting
/// (host pattern -> profile name).
#[derive(Debug, Default)]
pub struct AutoSwitchPlugin {
    rules: BTreeMap<String, String>,
}

impl AutoSwitchPlugin {
    pub const NAME: &'static str = "auto-switch";

    pub fn new() -> Self {
        Self::default()
    }

    /// Profile that should handle `url`, if a rule matches its host.
    ///
    /// A pattern matches the host itself and any of its subdomains; the
    /// longest matching pattern wins.
    pub fn profile_for(&self, url: &str) -> Option<&str> {
        let host = host_of(url)?;
        self.rules
            .iter()
            .filter(|(pattern, _)| {
                host == pattern.as_str()
                    || host
                        .strip_suffix(pattern.as_str())
                        .is_some_and(|rest| rest.ends_with('.'))
            })
            .max_by_key(|(pattern, _)| pattern.len())
            .map(|(_, profile)| profile.as_str())
    }
}

fn host_of(url: &str) -> Option<String> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?;
    let host = host.split(':').next()?.trim().to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}

impl Plugin for AutoSwitchPlugin {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: Self::NAME.to_string(),
            description: "Open sites in the profile assigned to them".to_string(),
            author: "Gyarados".to_string(),
            version: crate::VERSION.to_string(),
        }
    }

    fn activate(&mut self, ctx: &PluginContext<'_>) -> Result<()> {
        let known = ctx.store.list_profiles()?;
        self.rules.clear();
        for (pattern, profile) in &ctx.config.auto_switch_profiles {
            if !known.contains(profile) {
                log_warn!(
                    ctx.log,
                    "PLUGIN",
                    "Ignoring auto-switch rule {} -> {}: no such profile",
                    pattern,
                    profile
                );
                continue;
            }
            self.rules
                .insert(pattern.trim().to_ascii_lowercase(), profile.clone());
        }
        Ok(())
    }

    fn deactivate(&mut self, _ctx: &PluginContext<'_>) -> Result<()> {
        self.rules.clear();
        Ok(())
    }
}

/// The plugins shipped with the browser.
pub fn builtin_plugins() -> Vec<Box<dyn Plugin>> {
    vec![Box::new(AutoSwitchPlugin::new())]
}
