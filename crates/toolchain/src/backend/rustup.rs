//! Real rustup backend using `rustup` commands.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::name::TargetTriple;
use crate::platform;
use crate::types::InstallOptions;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Backend that executes real `rustup` commands.
#[derive(Debug, Clone)]
pub struct RustupBackend {
    /// Path to the rustup executable
    rustup_path: PathBuf,
    /// RUSTUP_HOME passed to every invocation, if overridden
    rustup_home: Option<PathBuf>,
}

impl RustupBackend {
    /// Create a new RustupBackend.
    ///
    /// Returns an error if rustup is not installed.
    pub fn new() -> Result<Self> {
        let rustup_path = find_rustup()?;
        log::debug!("using rustup at {}", rustup_path.display());
        Ok(Self {
            rustup_path,
            rustup_home: None,
        })
    }

    /// Create a backend for a specific rustup executable.
    pub fn with_path(rustup_path: impl Into<PathBuf>) -> Self {
        Self {
            rustup_path: rustup_path.into(),
            rustup_home: None,
        }
    }

    /// Run every command against a different RUSTUP_HOME.
    #[must_use]
    pub fn rustup_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.rustup_home = Some(home.into());
        self
    }

    /// Path to the rustup executable in use.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.rustup_path
    }

    /// Run a rustup command and return output.
    fn run_rustup(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(&self.rustup_path);
        cmd.args(args);
        if let Some(home) = &self.rustup_home {
            cmd.env("RUSTUP_HOME", home);
        }

        log::trace!("running rustup {}", args.join(" "));
        cmd.output().map_err(|e| Error::io(&self.rustup_path, e))
    }

    /// Run a rustup command and check for success.
    fn run_rustup_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run_rustup(args)?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command: format!("rustup {}", args.join(" ")),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Backend for RustupBackend {
    fn default_host(&self) -> Result<TargetTriple> {
        let output = self.run_rustup_checked(&["show"])?;
        if let Some(host) = parse_default_host(&output) {
            return host.parse();
        }

        log::debug!("rustup show did not report a default host, detecting it");
        platform::host_triple()
    }

    fn list_toolchains(&self) -> Result<Vec<String>> {
        let output = self.run_rustup_checked(&["toolchain", "list"])?;
        Ok(lines(&output))
    }

    fn install_toolchain(&self, name: &str, options: &InstallOptions) -> Result<()> {
        let mut args = vec!["toolchain", "install", name];
        if let Some(profile) = options.profile {
            args.extend(["--profile", profile.as_str()]);
        }
        if !options.self_update {
            args.push("--no-self-update");
        }

        self.run_rustup_checked(&args)?;
        Ok(())
    }

    fn uninstall_toolchain(&self, name: &str) -> Result<()> {
        self.run_rustup_checked(&["toolchain", "uninstall", name])?;
        Ok(())
    }

    fn set_default(&self, name: &str) -> Result<()> {
        self.run_rustup_checked(&["default", name])?;
        Ok(())
    }

    fn list_targets(&self, toolchain: &str) -> Result<Vec<String>> {
        let output =
            self.run_rustup_checked(&["target", "list", "--installed", "--toolchain", toolchain])?;
        Ok(lines(&output))
    }

    fn add_target(&self, toolchain: &str, target: &str) -> Result<()> {
        self.run_rustup_checked(&["target", "add", "--toolchain", toolchain, target])?;
        Ok(())
    }

    fn remove_target(&self, toolchain: &str, target: &str) -> Result<()> {
        self.run_rustup_checked(&["target", "remove", "--toolchain", toolchain, target])?;
        Ok(())
    }
}

/// Default RUSTUP_HOME: `$RUSTUP_HOME`, else `~/.rustup`.
#[must_use]
pub fn default_rustup_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("RUSTUP_HOME")
        && !home.is_empty()
    {
        return Some(PathBuf::from(home));
    }
    dirs::home_dir().map(|h| h.join(".rustup"))
}

/// Find the rustup executable path.
fn find_rustup() -> Result<PathBuf> {
    if let Ok(path) = which::which("rustup") {
        return Ok(path);
    }

    // rustup-init puts the proxies in CARGO_HOME/bin, which may not be on PATH yet
    let cargo_home = std::env::var_os("CARGO_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".cargo")));
    if let Some(cargo_home) = cargo_home {
        let candidate = cargo_home
            .join("bin")
            .join(format!("rustup{}", std::env::consts::EXE_SUFFIX));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    Err(Error::RustupNotFound)
}

/// Extract the host triple from `rustup show` output.
fn parse_default_host(output: &str) -> Option<&str> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Default host:"))
        .map(str::trim)
        .filter(|host| !host.is_empty())
}

/// Non-empty trimmed lines.
fn lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
