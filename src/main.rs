use anyhow::{Context, Result};
use clap::Parser;
use gyarados::cli::{self, Cli};
use gyarados::profile::{AppPaths, LogHandle, ProfileStore};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match &cli.data_dir {
        Some(dir) => AppPaths::new(dir),
        None => AppPaths::resolve(),
    };

    // CLI --log-level takes precedence over GYARADOS_LOG, which falls back to info.
    let level = cli::resolve_log_level(
        cli.log_level,
        std::env::var(cli::LOG_LEVEL_ENV).ok().as_deref(),
    );
    let log = LogHandle::open(&paths.logs_dir(), level)
        .with_context(|| format!("failed to open log directory {}", paths.logs_dir().display()))?;
    if let Err(e) = log.install_global() {
        eprintln!("gyarados: warning: could not install logger: {e}");
    }

    log::info!(
        "Starting gyarados {} with data in {}",
        gyarados::VERSION,
        paths.root().display()
    );

    let store = ProfileStore::open(paths, log.clone());
    let stdin = std::io::stdin();
    let result = cli::run(cli, &store, &log, &mut stdin.lock(), &mut std::io::stdout());

    if let Err(ref e) = result {
        log::error!("{e:#}");
    }
    log::info!("Shutting down");
    log.close();

    if let Err(e) = result {
        eprintln!("gyarados: error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
