//! Plan display and execution for the CLI
//!
//! The engine wraps the declarative executor with:
//! 1. Diffing - show what reconciliation found
//! 2. Confirming - ask before touching the installation
//! 3. Reporting - summarize what applying did

pub mod differ;
pub mod executor;

pub use differ::display_diff;
pub use executor::{ExecuteOptions, confirm_proceed, execute, print_summary};
