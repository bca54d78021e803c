// Declarative commands (status, diff, apply)
pub mod declarative;

// Diagnostics
pub mod matcher;
