use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::app_dirs::AppDirs;

/// Filter built from a `RUST_LOG`-style directive; `None` disables logging
pub fn filter_from(directive: Option<&str>) -> Option<EnvFilter> {
    let directive = directive?.trim();
    if directive.is_empty() {
        return None;
    }
    EnvFilter::try_new(directive).ok()
}

/// Install a file-backed subscriber when `RUST_LOG` is set.
///
/// The terminal belongs to the TUI, so events go to the log file in the state
/// directory. Returns the log path when a subscriber was installed.
pub fn init() -> Option<PathBuf> {
    let directive = std::env::var("RUST_LOG").ok();
    let filter = filter_from(directive.as_deref())?;
    let path = AppDirs::log_path();
    init_with(filter, &path).then_some(path)
}

fn init_with(filter: EnvFilter, path: &Path) -> bool {
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return false;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return false;
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_ok()
}
