//! Host platform detection.
//!
//! rustup fills partial toolchain names from its default host triple. When
//! rustup cannot be asked (or is not installed yet) the host triple is
//! derived from the running binary's OS and architecture instead.
//!
//! # Example
//!
//! ```
//! use toolchain::platform;
//!
//! let platform = platform::detect().expect("unsupported platform");
//! println!("Running on: {}", platform.triple);
//! ```

use crate::error::{Error, Result};
use crate::name::TargetTriple;
use crate::types::Platform;

/// Detect the current platform.
///
/// # Supported Platforms
///
/// | OS      | Arch    | Triple                       |
/// |---------|---------|------------------------------|
/// | macOS   | ARM64   | aarch64-apple-darwin         |
/// | macOS   | x86_64  | x86_64-apple-darwin          |
/// | Linux   | ARM64   | aarch64-unknown-linux-gnu    |
/// | Linux   | x86_64  | x86_64-unknown-linux-gnu     |
/// | Linux   | RISC-V  | riscv64gc-unknown-linux-gnu  |
/// | Windows | ARM64   | aarch64-pc-windows-msvc      |
/// | Windows | x86_64  | x86_64-pc-windows-msvc       |
///
/// On musl-based Linux the `-musl` variant is returned.
///
/// # Errors
///
/// Returns `Error::UnsupportedPlatform` if the current platform is not supported.
pub fn detect() -> Result<Platform> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    let triple = match (os, arch) {
        // macOS
        ("macos", "aarch64") => "aarch64-apple-darwin",
        ("macos", "x86_64") => "x86_64-apple-darwin",

        // Linux (glibc)
        ("linux", "aarch64") => "aarch64-unknown-linux-gnu",
        ("linux", "x86_64") => "x86_64-unknown-linux-gnu",
        ("linux", "riscv64") => "riscv64gc-unknown-linux-gnu",

        // Windows
        ("windows", "aarch64") => "aarch64-pc-windows-msvc",
        ("windows", "x86_64") => "x86_64-pc-windows-msvc",

        _ => {
            return Err(Error::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            });
        }
    };

    let triple = if is_musl() {
        to_musl_triple(triple).unwrap_or(triple)
    } else {
        triple
    };

    Ok(Platform::new(os, arch, triple))
}

/// Detect the host triple of the running process.
pub fn host_triple() -> Result<TargetTriple> {
    detect()?.host_triple()
}

/// Check if we're running on a musl-based Linux.
///
/// Returns `false` on non-Linux platforms.
#[must_use]
pub fn is_musl() -> bool {
    if std::env::consts::OS != "linux" {
        return false;
    }

    let musl_paths = ["/lib/ld-musl-x86_64.so.1", "/lib/ld-musl-aarch64.so.1"];

    musl_paths.iter().any(|p| std::path::Path::new(p).exists())
}

/// Get the musl variant of a platform triple.
///
/// Returns `None` for non-Linux triples or unsupported architectures.
#[must_use]
pub fn to_musl_triple(triple: &str) -> Option<&'static str> {
    match triple {
        "aarch64-unknown-linux-gnu" => Some("aarch64-unknown-linux-musl"),
        "x86_64-unknown-linux-gnu" => Some("x86_64-unknown-linux-musl"),
        _ => None,
    }
}
