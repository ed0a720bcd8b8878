//! XDG-style path utilities for configuration files.
//!
//! Prefers XDG Base Directory conventions over OS-specific locations, so
//! the files live in the same place on macOS and Linux.

use std::path::PathBuf;

/// Returns the configuration directory for convo.
///
/// Resolution order:
/// 1. `$XDG_CONFIG_HOME/convo` if `XDG_CONFIG_HOME` is set
/// 2. `~/.config/convo` otherwise
///
/// # Panics
///
/// Panics if the home directory cannot be determined.
pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME").map_or_else(
        |_| home_dir().join(".config").join("convo"),
        |xdg| PathBuf::from(xdg).join("convo"),
    )
}

/// Returns the default secrets file, `<config_dir>/secrets.toml`.
pub fn secrets_file() -> PathBuf {
    config_dir().join("secrets.toml")
}

/// Returns the user's home directory.
///
/// # Panics
///
/// Panics if the home directory cannot be determined.
#[allow(clippy::expect_used)]
fn home_dir() -> PathBuf {
    dirs::home_dir().expect("Failed to determine home directory")
}
