//! # toolchain
//!
//! Pure Rust library for inspecting and managing rustup toolchains.
//!
//! This crate provides functionality for:
//! - Parsing partial toolchain names (`stable`, `nightly-msvc`) and
//!   resolving them against the host triple
//! - Recognizing a toolchain in `rustup toolchain list` output
//! - Installing and removing toolchains and their targets
//! - Choosing the default toolchain
//! - Platform detection for the host triple
//!
//! ## Example
//!
//! ```no_run
//! use toolchain::{Client, InstallOptions, Profile};
//!
//! let client = Client::new().expect("rustup not installed");
//!
//! if !client.is_installed("nightly").unwrap() {
//!     client
//!         .install("nightly", &InstallOptions::new().profile(Profile::Minimal))
//!         .unwrap();
//! }
//!
//! for tc in client.installed().unwrap() {
//!     println!("{tc}");
//! }
//! ```
//!
//! ## Testing
//!
//! [`MockBackend`] keeps toolchains in memory:
//!
//! ```
//! use toolchain::{Client, MockBackend};
//!
//! let client = Client::with_backend(Box::new(
//!     MockBackend::new().with_toolchain("stable-x86_64-unknown-linux-gnu (default)"),
//! ));
//! assert!(client.is_installed("stable").unwrap());
//! assert!(!client.is_installed("beta").unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod matcher;
pub mod name;
pub mod platform;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use matcher::ToolchainMatcher;
pub use name::{TargetTriple, ToolchainDesc};
pub use types::{InstallOptions, InstalledToolchain, Platform, Profile};

use backend::Backend;
pub use backend::MockBackend;
use backend::rustup::RustupBackend;

/// High-level client for toolchain operations.
pub struct Client {
    backend: Box<dyn Backend>,
    host: Option<TargetTriple>,
}

impl Client {
    /// Create a new Client backed by the rustup on PATH.
    ///
    /// # Errors
    ///
    /// Returns `Error::RustupNotFound` if rustup is not installed.
    pub fn new() -> Result<Self> {
        Ok(Self::with_backend(Box::new(RustupBackend::new()?)))
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            host: None,
        }
    }

    /// Resolve partial names against this host instead of asking rustup.
    #[must_use]
    pub fn with_host(mut self, host: TargetTriple) -> Self {
        self.host = Some(host);
        self
    }

    // =========================================================================
    // Names
    // =========================================================================

    /// The host triple partial names are resolved against.
    pub fn host(&self) -> Result<TargetTriple> {
        match &self.host {
            Some(host) => Ok(host.clone()),
            None => self.backend.default_host(),
        }
    }

    /// Resolve a possibly partial toolchain name to its full form.
    pub fn resolve(&self, name: &str) -> Result<ToolchainDesc> {
        Ok(name.parse::<ToolchainDesc>()?.resolve(&self.host()?))
    }

    /// Build a matcher for a possibly partial toolchain name.
    pub fn matcher(&self, name: &str) -> Result<ToolchainMatcher> {
        ToolchainMatcher::new(name, &self.host()?)
    }

    // =========================================================================
    // Toolchains
    // =========================================================================

    /// Raw `rustup toolchain list` lines.
    pub fn toolchain_lines(&self) -> Result<Vec<String>> {
        self.backend.list_toolchains()
    }

    /// Installed toolchains, without rustup's notices.
    pub fn installed(&self) -> Result<Vec<InstalledToolchain>> {
        Ok(self
            .backend
            .list_toolchains()?
            .iter()
            .filter_map(|line| InstalledToolchain::parse_line(line))
            .collect())
    }

    /// Check if a toolchain is installed.
    pub fn is_installed(&self, name: &str) -> Result<bool> {
        let matcher = self.matcher(name)?;
        Ok(self
            .backend
            .list_toolchains()?
            .iter()
            .any(|line| matcher.matches(line)))
    }

    /// Install a toolchain.
    pub fn install(&self, name: &str, options: &InstallOptions) -> Result<()> {
        self.backend.install_toolchain(name, options)
    }

    /// Uninstall a toolchain.
    pub fn uninstall(&self, name: &str) -> Result<()> {
        self.backend.uninstall_toolchain(name)
    }

    /// The toolchain rustup currently uses by default, if any.
    pub fn default_toolchain(&self) -> Result<Option<InstalledToolchain>> {
        Ok(self.installed()?.into_iter().find(|tc| tc.is_default))
    }

    /// Make an installed toolchain the default.
    pub fn set_default(&self, name: &str) -> Result<()> {
        self.backend.set_default(name)
    }

    // =========================================================================
    // Targets
    // =========================================================================

    /// Targets installed for a toolchain.
    pub fn targets(&self, toolchain: &str) -> Result<Vec<String>> {
        self.backend.list_targets(toolchain)
    }

    /// Add a target to a toolchain.
    pub fn add_target(&self, toolchain: &str, target: &str) -> Result<()> {
        self.backend.add_target(toolchain, target)
    }

    /// Remove a target from a toolchain.
    pub fn remove_target(&self, toolchain: &str, target: &str) -> Result<()> {
        self.backend.remove_target(toolchain, target)
    }
}
