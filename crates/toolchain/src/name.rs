//! Toolchain names and target triples.
//!
//! rustup accepts partial toolchain names such as `stable` or `nightly-msvc`
//! and fills the missing architecture, OS and environment from the host
//! triple. [`ToolchainDesc`] splits a name into those parts using the same
//! component lists rustup knows about, and [`ToolchainDesc::resolve`] fills
//! the gaps.
//!
//! # Example
//!
//! ```
//! use toolchain::{TargetTriple, ToolchainDesc};
//!
//! let host: TargetTriple = "x86_64-unknown-linux-gnu".parse().unwrap();
//! let desc: ToolchainDesc = "nightly-2024-01-01".parse().unwrap();
//! assert_eq!(desc.resolve(&host).full_name(), "nightly-2024-01-01-x86_64-unknown-linux-gnu");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Architectures rustup recognizes in toolchain names.
pub const ARCHS: &[&str] = &[
    "i386",
    "i586",
    "i686",
    "x86_64",
    "arm",
    "armv7",
    "armv7s",
    "aarch64",
    "mips",
    "mipsel",
    "mips64",
    "mips64el",
    "powerpc",
    "powerpc64",
    "powerpc64le",
    "riscv64gc",
    "s390x",
    "loongarch64",
];

/// Operating systems rustup recognizes in toolchain names.
pub const OSES: &[&str] = &[
    "pc-windows",
    "unknown-linux",
    "apple-darwin",
    "unknown-netbsd",
    "apple-ios",
    "linux",
    "rumprun-netbsd",
    "unknown-freebsd",
    "unknown-illumos",
];

/// Environments rustup recognizes in toolchain names.
pub const ENVS: &[&str] = &[
    "gnu",
    "gnux32",
    "msvc",
    "gnueabi",
    "gnueabihf",
    "gnuabi64",
    "androideabi",
    "android",
    "musl",
];

fn alternation(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| regex::escape(item))
        .collect::<Vec<_>>()
        .join("|")
}

static TRIPLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        "^({})-({})(?:-({}))?$",
        alternation(ARCHS),
        alternation(OSES),
        alternation(ENVS)
    );
    Regex::new(&pattern).expect("component alternation is a valid regex")
});

static TOOLCHAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        "^(.+?)(?:-({}))?(?:-({}))?(?:-({}))?$",
        alternation(ARCHS),
        alternation(OSES),
        alternation(ENVS)
    );
    Regex::new(&pattern).expect("component alternation is a valid regex")
});

/// A host or target triple split into rustup's components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetTriple {
    /// CPU architecture (e.g. "x86_64").
    pub arch: String,
    /// Vendor and OS (e.g. "unknown-linux", "apple-darwin").
    pub os: String,
    /// ABI environment, if any (e.g. "gnu", "msvc").
    pub env: Option<String>,
}

impl FromStr for TargetTriple {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = TRIPLE_RE
            .captures(s.trim())
            .ok_or_else(|| Error::InvalidTriple(s.to_string()))?;

        Ok(Self {
            arch: caps[1].to_string(),
            os: caps[2].to_string(),
            env: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch, self.os)?;
        if let Some(env) = &self.env {
            write!(f, "-{env}")?;
        }
        Ok(())
    }
}

/// A possibly partial toolchain name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolchainDesc {
    /// Release channel, version or custom name (e.g. "stable", "1.75.0").
    pub channel: String,
    /// Architecture, when the name spells it out.
    pub arch: Option<String>,
    /// Vendor and OS, when the name spells it out.
    pub os: Option<String>,
    /// Environment, when the name spells it out.
    pub env: Option<String>,
}

impl ToolchainDesc {
    /// Fill missing components from the host triple.
    ///
    /// The environment is only taken from the host when the OS is too, so
    /// `custom-pc-windows` on a Linux host stays `custom-x86_64-pc-windows`
    /// rather than picking up `gnu`.
    #[must_use]
    pub fn resolve(&self, host: &TargetTriple) -> Self {
        let (os, env) = match &self.os {
            Some(os) => (os.clone(), self.env.clone()),
            None => (host.os.clone(), self.env.clone().or_else(|| host.env.clone())),
        };

        Self {
            channel: self.channel.clone(),
            arch: Some(self.arch.clone().unwrap_or_else(|| host.arch.clone())),
            os: Some(os),
            env,
        }
    }

    /// Whether architecture and OS are both present.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.arch.is_some() && self.os.is_some()
    }

    /// The name with every present component joined by `-`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut name = self.channel.clone();
        for part in [&self.arch, &self.os, &self.env].into_iter().flatten() {
            name.push('-');
            name.push_str(part);
        }
        name
    }
}

impl FromStr for ToolchainDesc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidToolchain(s.to_string());
        if s.is_empty() || s.starts_with('-') || s.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let caps = TOOLCHAIN_RE.captures(s).ok_or_else(invalid)?;
        let part = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

        Ok(Self {
            channel: caps[1].to_string(),
            arch: part(2),
            os: part(3),
            env: part(4),
        })
    }
}

impl fmt::Display for ToolchainDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}
