//! Terminal lines for toolsync output
//!
//! Status lines start with one symbol: `✓` in sync, `⚠` drift, `ℹ` notes,
//! `✗` errors (on stderr). Plan entries use `+ - ~` and are printed by the
//! diff display instead.

use colored::Colorize;

/// Note that is neither good nor bad news
pub fn info(msg: &str) {
    println!("{} {msg}", "ℹ".blue());
}

/// Everything matches the config
pub fn success(msg: &str) {
    println!("{} {msg}", "✓".green());
}

/// Installed state has drifted from the config
pub fn warn(msg: &str) {
    println!("{} {msg}", "⚠".yellow());
}

/// Command failure, printed to stderr
pub fn error(msg: &str) {
    eprintln!("{} {msg}", "✗".red());
}

/// Indented secondary line, e.g. the advice under an error
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Underlined title at the top of `status`
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// One resource kind's block in `status`
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// `key: value` detail line, as printed by `matcher`
pub fn kv(key: &str, value: &str) {
    println!("  {}: {value}", key.dimmed());
}

/// "1 toolchain", "3 targets"
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
