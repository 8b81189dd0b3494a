//! Configuration path resolution

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "FOSSA_DIAG_CONFIG_DIR";

const APP_NAME: &str = "fossa-diag";

/// Get the configuration directory path
///
/// `FOSSA_DIAG_CONFIG_DIR` wins; otherwise `$XDG_CONFIG_HOME/fossa-diag` or
/// `~/.config/fossa-diag` on Unix and the roaming AppData folder on Windows.
pub fn config_dir() -> PathBuf {
    config_dir_from(|key| std::env::var(key).ok())
}

/// Resolve the configuration directory using `lookup` to read variables
pub fn config_dir_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    if cfg!(windows) {
        return ProjectDirs::from("", "", APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(fallback_dir);
    }

    lookup("XDG_CONFIG_HOME")
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .or_else(|| BaseDirs::new().map(|dirs| dirs.home_dir().join(".config")))
        .map(|base| base.join(APP_NAME))
        .unwrap_or_else(fallback_dir)
}

/// Get the configuration file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.yaml")
}

fn fallback_dir() -> PathBuf {
    PathBuf::from(".config").join(APP_NAME)
}
