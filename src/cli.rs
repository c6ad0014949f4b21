//! Command-line interface for gyarados.
//!
//! Without a subcommand the CLI acts as the pre-launch profile dialog: it
//! opens the selected profile (asking for its password if it is encrypted),
//! activates the plugins and reports what the session restore would open.
//! The subcommands manage profiles and their collections directly.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use gyarados_profile::collections::{bookmarks, history};
use gyarados_profile::session::restore;
use gyarados_profile::{
    Config, DEFAULT_PROFILE, HistoryAge, LogHandle, ProfileStore, SaveOutcome,
};
use log::LevelFilter;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::plugins::{PluginContext, PluginRegistry, builtin_plugins};
use crate::prompt;

/// Environment variable consulted for the log level when `--log-level` is
/// not given.
pub const LOG_LEVEL_ENV: &str = "GYARADOS_LOG";

/// Wrong passwords accepted before giving up on an encrypted profile.
pub const MAX_PASSWORD_ATTEMPTS: u32 = 3;

/// gyarados - profile-aware multi-tab browser
#[derive(Parser, Debug)]
#[command(name = "gyarados")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Profile to open or operate on
    #[arg(short, long, global = true, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Data directory (overrides GYARADOS_HOME)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, delete and inspect profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Bookmarks of the selected profile
    Bookmarks {
        #[command(subcommand)]
        action: BookmarkCommand,
    },
    /// Browsing history of the selected profile
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Saved session of the selected profile
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },
    /// List the built-in plugins
    Plugins {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// List all profiles
    List,
    /// Create a new profile
    Create {
        name: String,
        /// Protect the profile settings with a password
        #[arg(short, long)]
        encrypt: bool,
    },
    /// Delete a profile and everything it stores
    Delete {
        name: String,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Show the settings of a profile
    Show { name: String },
    /// Change the password of an encrypted profile
    Passwd { name: String },
}

#[derive(Subcommand, Debug)]
pub enum BookmarkCommand {
    /// List bookmarks, optionally filtered by title or URL
    List {
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Add the URL if it is not bookmarked, remove it if it is
    Toggle {
        url: String,
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Delete bookmarks by their list index
    Delete {
        #[arg(required = true)]
        indices: Vec<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List history, most recent first
    List {
        #[arg(short, long)]
        filter: Option<String>,
        #[arg(short, long, value_enum)]
        age: Option<AgeArg>,
    },
    /// Export history as CSV
    Export { path: PathBuf },
    /// Delete history entries by their list index
    Delete {
        #[arg(required = true)]
        indices: Vec<usize>,
    },
    /// Delete the whole history
    Clear {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Show the tabs a restore would open
    Show,
    /// Forget the saved session
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeArg {
    Today,
    Week,
    Month,
}

impl From<AgeArg> for HistoryAge {
    fn from(age: AgeArg) -> Self {
        match age {
            AgeArg::Today => HistoryAge::Today,
            AgeArg::Week => HistoryAge::LastWeek,
            AgeArg::Month => HistoryAge::LastMonth,
        }
    }
}

/// `--log-level`, then `$GYARADOS_LOG`, then `info`.
pub fn resolve_log_level(flag: Option<LevelFilter>, env: Option<&str>) -> LevelFilter {
    flag.or_else(|| env.and_then(|v| v.trim().parse().ok()))
        .unwrap_or(LevelFilter::Info)
}

/// Run `cli` against `store`, reading answers from `input` and writing
/// everything the user sees to `out`.
pub fn run<R: BufRead, W: Write>(
    cli: Cli,
    store: &ProfileStore,
    log: &LogHandle,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let profile = cli.profile;
    match cli.command {
        None => launch(store, log, &profile, input, out),
        Some(Commands::Profiles { action }) => profiles(store, action, input, out),
        Some(Commands::Bookmarks { action }) => bookmarks_cmd(store, &profile, action, out),
        Some(Commands::History { action }) => history_cmd(store, &profile, action, input, out),
        Some(Commands::Session { action }) => session_cmd(store, &profile, action, out),
        Some(Commands::Plugins { json }) => {
            let registry = registry(log)?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&registry.info())?)?;
                return Ok(());
            }
            for info in registry.info() {
                writeln!(
                    out,
                    "{} v{} by {}: {}",
                    info.metadata.name,
                    info.metadata.version,
                    info.metadata.author,
                    info.metadata.description
                )?;
            }
            Ok(())
        }
    }
}

fn registry(log: &LogHandle) -> Result<PluginRegistry> {
    let mut registry = PluginRegistry::new(log.clone());
    for plugin in builtin_plugins() {
        registry.register(plugin)?;
    }
    Ok(registry)
}

/// Open profile `name`, asking for its password if needed.
pub fn open_profile<R: BufRead, W: Write>(
    store: &ProfileStore,
    name: &str,
    input: &mut R,
    out: &mut W,
) -> Result<Config> {
    if !store.is_encrypted(name)? {
        return store
            .load_profile(name, |_| None)
            .with_context(|| format!("failed to open profile '{name}'"));
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        let Some(password) = prompt::password(input, out, &format!("Password for '{name}': "))?
        else {
            bail!("no password given for profile '{name}'");
        };
        match store.load_profile(name, |_| Some(password.as_str().to_owned())) {
            Ok(config) => return Ok(config),
            Err(e) if e.is_authentication() && attempt < MAX_PASSWORD_ATTEMPTS => {
                writeln!(out, "Wrong password, try again.")?;
            }
            Err(e) => return Err(e).with_context(|| format!("failed to open profile '{name}'")),
        }
    }
}

fn launch<R: BufRead, W: Write>(
    store: &ProfileStore,
    log: &LogHandle,
    name: &str,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let config = open_profile(store, name, input, out)?;
    log::info!("Opened profile '{}'", config.profile_name());

    let mut registry = registry(log)?;
    let ctx = PluginContext {
        config: &config,
        store,
        log,
    };
    let active = registry.activate_all(&ctx);

    writeln!(
        out,
        "Profile '{}' ready ({} bookmarks, {} of {} plugins active)",
        config.profile_name(),
        config.bookmarks.len(),
        active,
        registry.info().len()
    )?;

    let session = if config.save_session {
        store.load_session(name)?
    } else {
        None
    };
    match session {
        Some(snapshot) if !snapshot.is_empty() => {
            let plan = restore(&snapshot);
            writeln!(out, "Restoring {} tab(s):", plan.tabs.len())?;
            for (index, tab) in plan.tabs.iter().enumerate() {
                let marker = if index == plan.current_index { "*" } else { " " };
                writeln!(out, "{marker} {}", tab.url)?;
            }
        }
        _ => writeln!(out, "Home page: {}", config.home_page)?,
    }

    registry.deactivate_all(&ctx);
    if store.save_profile(&config)? == SaveOutcome::SkippedLocked {
        log::warn!("Profile '{}' was locked; settings not saved", name);
    }
    Ok(())
}

fn profiles<R: BufRead, W: Write>(
    store: &ProfileStore,
    action: ProfileCommand,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    match action {
        ProfileCommand::List => {
            for name in store.list_profiles()? {
                if store.is_encrypted(&name)? {
                    writeln!(out, "{name} (encrypted)")?;
                } else {
                    writeln!(out, "{name}")?;
                }
            }
        }
        ProfileCommand::Create { name, encrypt } => {
            let password = if encrypt {
                Some(prompt::new_password(input, out, &name)?)
            } else {
                None
            };
            store
                .create_profile(&name, password.as_deref().map(String::as_str))
                .with_context(|| format!("failed to create profile '{name}'"))?;
            writeln!(out, "Created profile '{name}'")?;
        }
        ProfileCommand::Delete { name, yes } => {
            if !yes
                && !prompt::confirm(
                    input,
                    out,
                    &format!("Delete profile '{name}' and all its data? This cannot be undone."),
                )?
            {
                writeln!(out, "Deletion cancelled.")?;
                return Ok(());
            }
            store
                .delete_profile(&name)
                .with_context(|| format!("failed to delete profile '{name}'"))?;
            writeln!(out, "Deleted profile '{name}'")?;
        }
        ProfileCommand::Show { name } => {
            let config = open_profile(store, &name, input, out)?;
            show_config(&config, out)?;
        }
        ProfileCommand::Passwd { name } => {
            let Some(old) = prompt::password(input, out, &format!("Current password for '{name}': "))?
            else {
                bail!("no password given for profile '{name}'");
            };
            let new = prompt::new_password(input, out, &name)?;
            store
                .change_password(&name, &old, &new)
                .with_context(|| format!("failed to change the password of '{name}'"))?;
            writeln!(out, "Password changed for '{name}'")?;
        }
    }
    Ok(())
}

fn show_config<W: Write>(config: &Config, out: &mut W) -> Result<()> {
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    writeln!(out, "Profile:         {}", config.profile_name())?;
    writeln!(out, "Encrypted:       {}", if config.is_encrypted() { "yes" } else { "no" })?;
    writeln!(out, "Home page:       {}", config.home_page)?;
    writeln!(out, "Search engine:   {}", config.default_search_engine)?;
    writeln!(out, "Language:        {}", config.current_language)?;
    writeln!(out, "Window size:     {}x{}", config.window_size[0], config.window_size[1])?;
    writeln!(out, "Dark theme:      {}", on_off(config.dark_theme))?;
    writeln!(out, "Private mode:    {}", on_off(config.private_mode))?;
    writeln!(out, "Ad blocking:     {}", on_off(config.adblock_enabled))?;
    writeln!(out, "Save session:    {}", on_off(config.save_session))?;
    writeln!(out, "Bookmarks:       {}", config.bookmarks.len())?;
    writeln!(out, "Pinned tabs:     {}", config.pinned_tabs.len())?;
    writeln!(out, "Apps:            {}", config.apps.len())?;
    Ok(())
}

fn bookmarks_cmd<W: Write>(
    store: &ProfileStore,
    profile: &str,
    action: BookmarkCommand,
    out: &mut W,
) -> Result<()> {
    let manager = store.bookmarks();
    match action {
        BookmarkCommand::List { filter } => {
            let items = manager.try_load(profile)?;
            let query = filter.unwrap_or_default();
            for (index, bookmark) in items.iter().enumerate() {
                if !bookmarks::filter(std::slice::from_ref(bookmark), &query).is_empty() {
                    writeln!(out, "{index:>3}  {}  {}", bookmark.title, bookmark.url)?;
                }
            }
        }
        BookmarkCommand::Toggle { url, title } => {
            let title = title.unwrap_or_else(|| url.clone());
            if manager.toggle(profile, &title, &url)? {
                writeln!(out, "Bookmarked {url}")?;
            } else {
                writeln!(out, "Removed bookmark {url}")?;
            }
        }
        BookmarkCommand::Delete { indices } => {
            let left = manager.delete_by_indices(profile, &indices)?;
            writeln!(out, "{} bookmark(s) left", left.len())?;
        }
    }
    Ok(())
}

fn history_cmd<R: BufRead, W: Write>(
    store: &ProfileStore,
    profile: &str,
    action: HistoryCommand,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let manager = store.history();
    match action {
        HistoryCommand::List { filter, age } => {
            let entries = manager.try_load(profile)?;
            let now = chrono::Local::now().naive_local();
            let query = filter.unwrap_or_default();
            for (index, entry) in entries.iter().enumerate() {
                let matches_age = age.is_none_or(|age| HistoryAge::from(age).matches(entry.time, now));
                if matches_age && !history::filter(std::slice::from_ref(entry), &query).is_empty() {
                    writeln!(
                        out,
                        "{index:>3}  {}  {}  {}",
                        entry.time.format("%Y-%m-%d %H:%M:%S"),
                        entry.title,
                        entry.url
                    )?;
                }
            }
        }
        HistoryCommand::Export { path } => {
            let count = manager
                .export_csv(profile, &path)
                .with_context(|| format!("failed to export history to {}", path.display()))?;
            writeln!(out, "Exported {count} entries to {}", path.display())?;
        }
        HistoryCommand::Delete { indices } => {
            let left = manager.delete_by_indices(profile, &indices)?;
            writeln!(out, "{} entries left", left.len())?;
        }
        HistoryCommand::Clear { yes } => {
            if !yes && !prompt::confirm(input, out, "Delete the entire history?")? {
                writeln!(out, "Nothing deleted.")?;
                return Ok(());
            }
            manager.clear(profile)?;
            writeln!(out, "History cleared")?;
        }
    }
    Ok(())
}

fn session_cmd<W: Write>(
    store: &ProfileStore,
    profile: &str,
    action: SessionCommand,
    out: &mut W,
) -> Result<()> {
    match action {
        SessionCommand::Show => match store.load_session(profile)? {
            Some(snapshot) if !snapshot.is_empty() => {
                let plan = restore(&snapshot);
                for (index, tab) in plan.tabs.iter().enumerate() {
                    let marker = if index == plan.current_index { "*" } else { " " };
                    let mut flags = Vec::new();
                    if tab.pinned {
                        flags.push("pinned");
                    }
                    if tab.private {
                        flags.push("private");
                    }
                    let title = tab.custom_title.as_deref().unwrap_or(&tab.url);
                    if flags.is_empty() {
                        writeln!(out, "{marker} {title}  {}", tab.url)?;
                    } else {
                        writeln!(out, "{marker} {title}  {}  [{}]", tab.url, flags.join(", "))?;
                    }
                }
            }
            _ => writeln!(out, "No saved session")?,
        },
        SessionCommand::Clear => {
            store.clear_session(profile)?;
            writeln!(out, "Session cleared")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_precedence() {
        assert_eq!(
            resolve_log_level(Some(LevelFilter::Debug), Some("error")),
            LevelFilter::Debug
        );
        assert_eq!(resolve_log_level(None, Some(" warn ")), LevelFilter::Warn);
        assert_eq!(resolve_log_level(None, Some("loud")), LevelFilter::Info);
        assert_eq!(resolve_log_level(None, None), LevelFilter::Info);
    }

    #[test]
    fn test_parse_global_profile_after_subcommand() {
        let cli = Cli::try_parse_from(["gyarados", "bookmarks", "list", "--profile", "work"]).unwrap();
        assert_eq!(cli.profile, "work");
        assert!(matches!(
            cli.command,
            Some(Commands::Bookmarks {
                action: BookmarkCommand::List { filter: None }
            })
        ));
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["gyarados"]).unwrap();
        assert_eq!(cli.profile, "default");
        assert!(cli.command.is_none());
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_delete_requires_indices() {
        assert!(Cli::try_parse_from(["gyarados", "history", "delete"]).is_err());
    }
}
