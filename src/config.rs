//! Configuration loading
//!
//! The config lives in `config.toml` (or `config.json`) in the config
//! directory:
//!
//! ```toml
//! toolchains = ["stable", { title = "nightly-2024-01-01" }, { title = "beta", ensure = "absent" }]
//!
//! [rustup]
//! profile = "minimal"
//! default_toolchain = "stable"
//!
//! [[targets]]
//! title = "wasm32-unknown-unknown"
//! toolchain = "stable"
//! ```

use anyhow::{Context, Result};
use declarative::{Record, ReconcileOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use toolchain::{InstallOptions, Profile};

use crate::paths;

/// Base name of the config file, without extension
pub const CONFIG_NAME: &str = "config";

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Formats in lookup order
    pub const ALL: [Self; 2] = [Self::Toml, Self::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(self, content: &str) -> Result<T, ConfigError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            Self::Json => serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }
}

/// Errors specific to locating and parsing the config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no {name}.toml or {name}.json in {}", .dir.display())]
    NotFound { dir: PathBuf, name: String },

    #[error("unsupported config extension: {}", .0.display())]
    UnknownFormat(PathBuf),

    #[error("invalid {format}: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

/// A collection entry: either a bare title or a full record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Title(String),
    Record(Record),
}

impl Entry {
    pub fn into_record(self) -> Record {
        match self {
            Self::Title(title) => Record::titled(title),
            Self::Record(record) => record,
        }
    }
}

/// rustup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RustupConfig {
    /// RUSTUP_HOME override (supports ~ and env vars)
    pub home: Option<String>,
    /// Profile for newly installed toolchains
    pub profile: Option<Profile>,
    /// Host triple used to resolve partial toolchain names
    pub default_host: Option<String>,
    /// Toolchain rustup should use by default (`rustup default`)
    pub default_toolchain: Option<String>,
    /// Let rustup update itself while installing
    pub self_update: bool,
    /// Double-check identity matches structurally
    pub verify_identity: bool,
}

impl Default for RustupConfig {
    fn default() -> Self {
        Self {
            home: None,
            profile: None,
            default_host: None,
            default_toolchain: None,
            self_update: false,
            verify_identity: true,
        }
    }
}

impl RustupConfig {
    pub fn home_path(&self) -> Option<PathBuf> {
        self.home.as_deref().map(paths::expand)
    }

    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            profile: self.profile,
            self_update: self.self_update,
        }
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            verify_identity: self.verify_identity,
        }
    }
}

/// The toolsync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rustup: RustupConfig,
    pub toolchains: Vec<Entry>,
    pub targets: Vec<Entry>,
}

impl Config {
    /// Load from an explicit file, or from the config directory
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf)> {
        match path {
            Some(path) => {
                let format = ConfigFormat::from_path(path)
                    .ok_or_else(|| ConfigError::UnknownFormat(path.to_path_buf()))?;
                Ok((load_file(path, format)?, path.to_path_buf()))
            }
            None => {
                let dir = paths::config_dir()?;
                let (config, format) = load_config(&dir, CONFIG_NAME)?;
                Ok((config, dir.join(format!("{CONFIG_NAME}.{}", format.extension()))))
            }
        }
    }

    /// Desired toolchain records, in config order
    pub fn toolchain_records(&self) -> Vec<Record> {
        self.toolchains.iter().cloned().map(Entry::into_record).collect()
    }

    /// Desired target records, in config order
    pub fn target_records(&self) -> Vec<Record> {
        self.targets.iter().cloned().map(Entry::into_record).collect()
    }
}

/// Load `{name}.toml` or `{name}.json` from `dir`, whichever exists first
pub fn load_config<T: serde::de::DeserializeOwned>(
    dir: &Path,
    name: &str,
) -> Result<(T, ConfigFormat)> {
    for format in ConfigFormat::ALL {
        let path = dir.join(format!("{name}.{}", format.extension()));
        if path.exists() {
            log::debug!("Loading config from {}", path.display());
            return Ok((load_file(&path, format)?, format));
        }
    }

    Err(ConfigError::NotFound {
        dir: dir.to_path_buf(),
        name: name.to_string(),
    }
    .into())
}

fn load_file<T: serde::de::DeserializeOwned>(path: &Path, format: ConfigFormat) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    format
        .parse(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))
}
