//! Core types for toolchain management.
//!
//! Platform information, rustup installation profiles and the entries
//! reported by `rustup toolchain list`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::name::TargetTriple;

/// Platform information.
///
/// Describes the operating system, architecture and host triple the process
/// runs on.
///
/// # Example
///
/// ```
/// use toolchain::Platform;
///
/// let platform = Platform::new("macos", "aarch64", "aarch64-apple-darwin");
/// assert_eq!(platform.triple, "aarch64-apple-darwin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system (e.g., "macos", "linux", "windows").
    pub os: String,
    /// CPU architecture (e.g., "aarch64", "x86_64").
    pub arch: String,
    /// Host triple (e.g., "aarch64-apple-darwin").
    pub triple: String,
}

impl Platform {
    /// Create a new platform.
    pub fn new(os: impl Into<String>, arch: impl Into<String>, triple: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
            triple: triple.into(),
        }
    }

    /// Parse the host triple into its components.
    pub fn host_triple(&self) -> Result<TargetTriple> {
        self.triple.parse()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.triple, self.os, self.arch)
    }
}

/// rustup installation profile.
///
/// Controls which components `rustup toolchain install` pulls in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// rustc, rust-std and cargo only.
    Minimal,
    /// Minimal plus rust-docs, rustfmt and clippy.
    #[default]
    Default,
    /// Every component available for the toolchain.
    Complete,
}

impl Profile {
    /// The name rustup uses for this profile.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Default => "default",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "minimal" => Ok(Self::Minimal),
            "default" => Ok(Self::Default),
            "complete" => Ok(Self::Complete),
            other => Err(Error::Other(format!(
                "unknown rustup profile '{other}' (expected minimal, default or complete)"
            ))),
        }
    }
}

/// Options for installing a toolchain.
///
/// # Example
///
/// ```
/// use toolchain::{InstallOptions, Profile};
///
/// let options = InstallOptions::new().profile(Profile::Minimal);
/// assert_eq!(options.profile, Some(Profile::Minimal));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Installation profile; rustup's configured default when unset.
    pub profile: Option<Profile>,
    /// Let rustup update itself during the install.
    pub self_update: bool,
}

impl InstallOptions {
    /// Create default install options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the installation profile.
    #[must_use]
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Allow rustup to update itself.
    #[must_use]
    pub fn self_update(mut self, self_update: bool) -> Self {
        self.self_update = self_update;
        self
    }
}

/// Marker rustup appends to the default toolchain's line.
pub const DEFAULT_MARKER: &str = " (default)";

/// Line rustup prints instead of a list when nothing is installed.
pub const NO_TOOLCHAINS: &str = "no installed toolchains";

/// A toolchain as reported by `rustup toolchain list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledToolchain {
    /// Full toolchain name, without any marker.
    pub name: String,
    /// Whether rustup marks this toolchain as the default.
    pub is_default: bool,
}

impl InstalledToolchain {
    /// Parse one line of `rustup toolchain list` output.
    ///
    /// Returns `None` for blank lines and the "no installed toolchains"
    /// notice. Trailing markers such as `(default)` or `(active, default)`
    /// are stripped.
    ///
    /// # Example
    ///
    /// ```
    /// use toolchain::InstalledToolchain;
    ///
    /// let tc = InstalledToolchain::parse_line("stable-x86_64-apple-darwin (default)").unwrap();
    /// assert_eq!(tc.name, "stable-x86_64-apple-darwin");
    /// assert!(tc.is_default);
    /// assert!(InstalledToolchain::parse_line("no installed toolchains").is_none());
    /// ```
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line == NO_TOOLCHAINS {
            return None;
        }

        let (name, markers) = match line.split_once(" (") {
            Some((name, rest)) => (name, rest.trim_end_matches(')')),
            None => (line, ""),
        };
        let is_default = markers.split(',').any(|m| m.trim() == "default");

        Some(Self {
            name: name.trim().to_string(),
            is_default,
        })
    }
}

impl fmt::Display for InstalledToolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default {
            write!(f, "{}{DEFAULT_MARKER}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}
