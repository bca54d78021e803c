//! Where toolsync finds its config
//!
//! `config.toml` (or `config.json`) is read from the first of:
//!
//! 1. `$TOOLSYNC_CONFIG_DIR`, with `~` and `$VARS` expanded
//! 2. `$XDG_CONFIG_HOME/toolsync`
//! 3. `%APPDATA%\toolsync` on Windows, `~/.config/toolsync` elsewhere
//!
//! `--config <file>` bypasses the lookup entirely. Paths written inside the
//! config (`[rustup] home`) go through [`expand`] as well.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::path::PathBuf;

/// Points toolsync at a config directory, e.g. one kept in a dotfiles repo
pub const ENV_CONFIG_DIR: &str = "TOOLSYNC_CONFIG_DIR";

const APP_DIR: &str = "toolsync";

/// Directory holding `config.toml`
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!("config dir {} (from {ENV_CONFIG_DIR})", path.display());
        return Ok(path);
    }

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg).join(APP_DIR);
        log::debug!("config dir {} (from XDG_CONFIG_HOME)", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join(APP_DIR);
            log::debug!("config dir {} (from APPDATA)", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join(APP_DIR);
    log::debug!("config dir {}", path.display());
    Ok(path)
}

/// Expand `~` and `$VARS` in a configured path
///
/// Undefined variables stay in the path verbatim.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
