//! Error types for toolchain operations.
//!
//! Errors are categorized so callers can decide whether a failed rustup
//! invocation is worth retrying and what to tell the user.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for toolchain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of toolchain errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// rustup could not reach the distribution server (transient, retryable).
    Network,
    /// Platform not supported.
    Platform,
    /// rustup, a toolchain or a target was not found.
    NotFound,
    /// Permission denied while touching rustup's files.
    Permission,
    /// A name or triple could not be parsed.
    Format,
    /// A rustup command exited unsuccessfully.
    Command,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Platform => "Unsupported platform",
            Self::NotFound => "Not found",
            Self::Permission => "Permission denied",
            Self::Format => "Invalid name",
            Self::Command => "rustup command failed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::Platform => "Set rustup.default_host in the config to override detection",
            Self::NotFound => "Install rustup from https://rustup.rs and check the toolchain name",
            Self::Permission => "Check permissions on RUSTUP_HOME",
            Self::Format => "Use a name like 'stable', 'nightly-2024-01-01' or 'stable-x86_64-pc-windows-msvc'",
            Self::Command => "Run the rustup command by hand to see the full output",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during toolchain operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to detect the current platform.
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform {
        /// Operating system.
        os: String,
        /// CPU architecture.
        arch: String,
    },

    /// The rustup executable is not on PATH.
    #[error("rustup not found in PATH")]
    RustupNotFound,

    /// A rustup invocation exited unsuccessfully.
    #[error("`{command}` failed{}: {}", .status.map(|c| format!(" with exit code {c}")).unwrap_or_default(), .stderr.trim())]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit code, if the process was not killed by a signal.
        status: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// A toolchain name could not be parsed.
    #[error("invalid toolchain name: '{0}'")]
    InvalidToolchain(String),

    /// A target triple could not be parsed.
    #[error("invalid target triple: '{0}'")]
    InvalidTriple(String),

    /// The generated matcher pattern did not compile.
    #[error("invalid toolchain pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// IO error while running a command or reading a file.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnsupportedPlatform { .. } => ErrorCategory::Platform,
            Error::RustupNotFound => ErrorCategory::NotFound,
            Error::CommandFailed { stderr, .. } => {
                let stderr = stderr.to_lowercase();
                if stderr.contains("could not download")
                    || stderr.contains("error sending request")
                    || stderr.contains("timed out")
                {
                    ErrorCategory::Network
                } else if stderr.contains("permission denied") {
                    ErrorCategory::Permission
                } else if stderr.contains("not installed") || stderr.contains("does not support") {
                    ErrorCategory::NotFound
                } else {
                    ErrorCategory::Command
                }
            }
            Error::InvalidToolchain(_) | Error::InvalidTriple(_) | Error::Pattern(_) => {
                ErrorCategory::Format
            }
            Error::Io { source, .. } => match source.kind() {
                io::ErrorKind::PermissionDenied => ErrorCategory::Permission,
                io::ErrorKind::NotFound => ErrorCategory::NotFound,
                _ => ErrorCategory::Other,
            },
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}
