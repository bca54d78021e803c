//! Matching installed toolchain lines against a requested name.
//!
//! `rustup toolchain list` prints fully qualified names, optionally followed
//! by ` (default)`. A [`ToolchainMatcher`] is built from a possibly partial
//! name and the host triple, and accepts exactly the line rustup would print
//! for that toolchain.

use regex::Regex;
use std::fmt;

use crate::error::Result;
use crate::name::{TargetTriple, ToolchainDesc};

/// Pattern that recognizes one toolchain in `rustup toolchain list` output.
///
/// # Example
///
/// ```
/// use toolchain::{TargetTriple, ToolchainMatcher};
///
/// let host: TargetTriple = "x86_64-apple-darwin".parse().unwrap();
/// let matcher = ToolchainMatcher::new("stable", &host).unwrap();
///
/// assert_eq!(matcher.as_str(), r"^stable-x86_64-apple-darwin(?: \(default\))?$");
/// assert!(matcher.matches("stable-x86_64-apple-darwin (default)"));
/// assert!(!matcher.matches("stable-x86_64-apple-darwin-extra"));
/// ```
#[derive(Debug, Clone)]
pub struct ToolchainMatcher {
    desc: ToolchainDesc,
    regex: Regex,
}

impl ToolchainMatcher {
    /// Build a matcher for `name`, filling missing components from `host`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidToolchain` when `name` cannot be parsed.
    pub fn new(name: &str, host: &TargetTriple) -> Result<Self> {
        let requested = name.parse::<ToolchainDesc>()?;
        let desc = requested.resolve(host);
        let regex = Regex::new(&pattern(&requested, &desc))?;
        Ok(Self { desc, regex })
    }

    /// The fully resolved toolchain this matcher looks for.
    #[must_use]
    pub fn toolchain(&self) -> &ToolchainDesc {
        &self.desc
    }

    /// The anchored pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether a line of `rustup toolchain list` output is this toolchain.
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

impl fmt::Display for ToolchainMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Components taken from the requested name are escaped, host components
/// are used as they are.
fn pattern(requested: &ToolchainDesc, resolved: &ToolchainDesc) -> String {
    let mut pattern = format!("^{}", regex::escape(&resolved.channel));
    let parts = [
        (&requested.arch, &resolved.arch),
        (&requested.os, &resolved.os),
        (&requested.env, &resolved.env),
    ];
    for (given, part) in parts {
        let Some(part) = part else { continue };
        pattern.push('-');
        if given.is_some() {
            pattern.push_str(&regex::escape(part));
        } else {
            pattern.push_str(part);
        }
    }
    pattern.push_str(r"(?: \(default\))?$");
    pattern
}
