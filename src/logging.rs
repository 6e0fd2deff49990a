//! Log file setup
//!
//! The TUI owns the terminal, so tracing output goes to a file. The filter
//! comes from `RUST_LOG` and defaults to `info`.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::default_log_path;

/// Picks the log file: the explicit path if given, else the cache directory.
pub fn resolve_log_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(default_log_path)
}

/// Installs the global subscriber writing to `path`.
///
/// Parent directories are created as needed. Fails if the file cannot be
/// opened or a subscriber is already installed.
pub fn init(path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()?;

    tracing::info!(path = %path.display(), "logging initialised");
    Ok(())
}

/// Sets up logging, reporting problems on stderr instead of failing startup.
pub fn init_or_warn(explicit: Option<&Path>) {
    let Some(path) = resolve_log_path(explicit) else {
        return;
    };
    if let Err(err) = init(&path) {
        eprintln!("warning: logging disabled ({}): {err}", path.display());
    }
}
