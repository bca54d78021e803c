//! Backend traits and implementations for talking to rustup.
//!
//! [`rustup::RustupBackend`] shells out to the `rustup` executable. Use
//! [`MockBackend`] for testing without touching the real installation:
//!
//! ```
//! use toolchain::backend::{Backend, MockBackend};
//! use toolchain::InstallOptions;
//!
//! let mock = MockBackend::new().with_toolchain("stable-x86_64-unknown-linux-gnu (default)");
//! mock.install_toolchain("nightly", &InstallOptions::default()).unwrap();
//!
//! let lines = mock.list_toolchains().unwrap();
//! assert_eq!(lines.len(), 2);
//! ```

pub mod rustup;

use crate::error::{Error, Result};
use crate::name::{TargetTriple, ToolchainDesc};
use crate::types::{InstallOptions, InstalledToolchain, NO_TOOLCHAINS};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

/// Backend trait for querying and changing toolchains.
///
/// Toolchain arguments are passed the way the user wrote them; rustup
/// resolves partial names itself.
pub trait Backend: Send + Sync {
    /// The host triple rustup fills partial names from.
    fn default_host(&self) -> Result<TargetTriple>;

    /// Raw lines of `rustup toolchain list`.
    ///
    /// May include a trailing ` (default)` marker or the
    /// "no installed toolchains" notice.
    fn list_toolchains(&self) -> Result<Vec<String>>;

    /// Install a toolchain.
    fn install_toolchain(&self, name: &str, options: &InstallOptions) -> Result<()>;

    /// Uninstall a toolchain.
    fn uninstall_toolchain(&self, name: &str) -> Result<()>;

    /// Make a toolchain rustup's default.
    fn set_default(&self, name: &str) -> Result<()>;

    /// Targets installed for a toolchain.
    fn list_targets(&self, toolchain: &str) -> Result<Vec<String>>;

    /// Add a target to a toolchain.
    fn add_target(&self, toolchain: &str, target: &str) -> Result<()>;

    /// Remove a target from a toolchain.
    fn remove_target(&self, toolchain: &str, target: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct MockState {
    toolchains: Vec<InstalledToolchain>,
    targets: BTreeMap<String, BTreeSet<String>>,
    calls: Vec<String>,
    failing: BTreeSet<String>,
}

/// Mock backend for testing without rustup.
///
/// Keeps toolchains and targets in memory, records every mutating call and
/// can be told to fail for specific names.
#[derive(Debug, Clone)]
pub struct MockBackend {
    host: TargetTriple,
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create an empty mock backend on an `x86_64-unknown-linux-gnu` host.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: TargetTriple {
                arch: "x86_64".into(),
                os: "unknown-linux".into(),
                env: Some("gnu".into()),
            },
            state: Arc::default(),
        }
    }

    /// Use a different host triple.
    #[must_use]
    pub fn with_host(mut self, host: TargetTriple) -> Self {
        self.host = host;
        self
    }

    /// Add an installed toolchain, given as a `rustup toolchain list` line.
    #[must_use]
    pub fn with_toolchain(self, line: &str) -> Self {
        if let Some(tc) = InstalledToolchain::parse_line(line) {
            self.state.lock().unwrap().toolchains.push(tc);
        }
        self
    }

    /// Add an installed target to a toolchain.
    #[must_use]
    pub fn with_target(self, toolchain: &str, target: &str) -> Self {
        let key = self.resolve(toolchain);
        self.state
            .lock()
            .unwrap()
            .targets
            .entry(key)
            .or_default()
            .insert(target.to_string());
        self
    }

    /// Make every mutating call mentioning `name` fail.
    #[must_use]
    pub fn failing_on(self, name: &str) -> Self {
        self.state.lock().unwrap().failing.insert(name.to_string());
        self
    }

    /// Mutating calls made so far, as `rustup` argument strings.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn resolve(&self, name: &str) -> String {
        name.parse::<ToolchainDesc>()
            .map_or_else(|_| name.to_string(), |d| d.resolve(&self.host).full_name())
    }

    fn record(&self, call: String, names: &[&str]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        if names.iter().any(|n| state.failing.contains(*n)) {
            return Err(Error::CommandFailed {
                command: format!("rustup {call}"),
                status: Some(1),
                stderr: "mock failure".into(),
            });
        }
        Ok(())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MockBackend {
    fn default_host(&self) -> Result<TargetTriple> {
        Ok(self.host.clone())
    }

    fn list_toolchains(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.toolchains.is_empty() {
            return Ok(vec![NO_TOOLCHAINS.to_string()]);
        }
        Ok(state.toolchains.iter().map(ToString::to_string).collect())
    }

    fn install_toolchain(&self, name: &str, options: &InstallOptions) -> Result<()> {
        let call = match options.profile {
            Some(profile) => format!("toolchain install {name} --profile {profile}"),
            None => format!("toolchain install {name}"),
        };
        self.record(call, &[name])?;

        let full = self.resolve(name);
        let mut state = self.state.lock().unwrap();
        if !state.toolchains.iter().any(|tc| tc.name == full) {
            let is_default = state.toolchains.is_empty();
            state.toolchains.push(InstalledToolchain {
                name: full,
                is_default,
            });
        }
        Ok(())
    }

    fn uninstall_toolchain(&self, name: &str) -> Result<()> {
        self.record(format!("toolchain uninstall {name}"), &[name])?;

        let full = self.resolve(name);
        let mut state = self.state.lock().unwrap();
        let before = state.toolchains.len();
        state.toolchains.retain(|tc| tc.name != full);
        if state.toolchains.len() == before {
            return Err(Error::CommandFailed {
                command: format!("rustup toolchain uninstall {name}"),
                status: Some(1),
                stderr: format!("error: no toolchain installed for '{name}'"),
            });
        }
        state.targets.remove(&full);
        Ok(())
    }

    fn set_default(&self, name: &str) -> Result<()> {
        self.record(format!("default {name}"), &[name])?;

        let full = self.resolve(name);
        let mut state = self.state.lock().unwrap();
        if !state.toolchains.iter().any(|tc| tc.name == full) {
            return Err(Error::CommandFailed {
                command: format!("rustup default {name}"),
                status: Some(1),
                stderr: format!("error: toolchain '{full}' is not installed"),
            });
        }
        for tc in &mut state.toolchains {
            tc.is_default = tc.name == full;
        }
        Ok(())
    }

    fn list_targets(&self, toolchain: &str) -> Result<Vec<String>> {
        let full = self.resolve(toolchain);
        let state = self.state.lock().unwrap();
        if !state.toolchains.iter().any(|tc| tc.name == full) {
            return Err(Error::CommandFailed {
                command: format!("rustup target list --installed --toolchain {toolchain}"),
                status: Some(1),
                stderr: format!("error: toolchain '{full}' is not installed"),
            });
        }

        let host = self.host.to_string();
        let mut targets = vec![host.clone()];
        if let Some(extra) = state.targets.get(&full) {
            targets.extend(extra.iter().filter(|t| **t != host).cloned());
        }
        Ok(targets)
    }

    fn add_target(&self, toolchain: &str, target: &str) -> Result<()> {
        self.record(
            format!("target add --toolchain {toolchain} {target}"),
            &[toolchain, target],
        )?;
        let full = self.resolve(toolchain);
        self.state
            .lock()
            .unwrap()
            .targets
            .entry(full)
            .or_default()
            .insert(target.to_string());
        Ok(())
    }

    fn remove_target(&self, toolchain: &str, target: &str) -> Result<()> {
        self.record(
            format!("target remove --toolchain {toolchain} {target}"),
            &[toolchain, target],
        )?;
        let full = self.resolve(toolchain);
        if let Some(targets) = self.state.lock().unwrap().targets.get_mut(&full) {
            targets.remove(target);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_empty() {
        let mock = MockBackend::new();
        assert_eq!(mock.list_toolchains().unwrap(), vec![NO_TOOLCHAINS]);
    }

    #[test]
    fn test_mock_backend_install_resolves_name() {
        let mock = MockBackend::new();
        mock.install_toolchain("stable", &InstallOptions::default())
            .unwrap();
        mock.install_toolchain("stable", &InstallOptions::default())
            .unwrap();

        assert_eq!(
            mock.list_toolchains().unwrap(),
            vec!["stable-x86_64-unknown-linux-gnu (default)"]
        );
        assert_eq!(mock.calls().len(), 2);
    }

    #[test]
    fn test_mock_backend_uninstall() {
        let mock = MockBackend::new().with_toolchain("beta-x86_64-unknown-linux-gnu");
        mock.uninstall_toolchain("beta").unwrap();
        assert!(mock.uninstall_toolchain("beta").is_err());
        assert_eq!(mock.calls(), vec!["toolchain uninstall beta", "toolchain uninstall beta"]);
    }

    #[test]
    fn test_mock_backend_set_default() {
        let mock = MockBackend::new()
            .with_toolchain("stable-x86_64-unknown-linux-gnu (default)")
            .with_toolchain("nightly-x86_64-unknown-linux-gnu");

        mock.set_default("nightly").unwrap();
        assert_eq!(
            mock.list_toolchains().unwrap(),
            vec![
                "stable-x86_64-unknown-linux-gnu",
                "nightly-x86_64-unknown-linux-gnu (default)"
            ]
        );
        assert!(mock.set_default("beta").is_err());
        assert_eq!(mock.calls(), vec!["default nightly", "default beta"]);
    }

    #[test]
    fn test_mock_backend_targets() {
        let mock = MockBackend::new()
            .with_toolchain("stable-x86_64-unknown-linux-gnu")
            .with_target("stable", "wasm32-unknown-unknown");

        assert_eq!(
            mock.list_targets("stable").unwrap(),
            vec!["x86_64-unknown-linux-gnu", "wasm32-unknown-unknown"]
        );

        mock.remove_target("stable", "wasm32-unknown-unknown").unwrap();
        assert_eq!(mock.list_targets("stable").unwrap(), vec!["x86_64-unknown-linux-gnu"]);
    }

    #[test]
    fn test_mock_backend_targets_of_missing_toolchain() {
        let mock = MockBackend::new();
        let err = mock.list_targets("nightly").unwrap_err();
        assert!(err.to_string().contains("is not installed"));
    }

    #[test]
    fn test_mock_backend_failure() {
        let mock = MockBackend::new().failing_on("nightly");
        assert!(
            mock.install_toolchain("nightly", &InstallOptions::default())
                .is_err()
        );
        assert_eq!(mock.list_toolchains().unwrap(), vec![NO_TOOLCHAINS]);
        assert_eq!(mock.calls(), vec!["toolchain install nightly"]);
    }

    #[test]
    fn test_mock_backend_profile_in_call() {
        let mock = MockBackend::new();
        mock.install_toolchain(
            "nightly",
            &InstallOptions::new().profile(crate::types::Profile::Minimal),
        )
        .unwrap();
        assert_eq!(mock.calls(), vec!["toolchain install nightly --profile minimal"]);
    }
}
