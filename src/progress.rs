//! Progress display for plan execution

use colored::Colorize;
use declarative::{ApplyResult, Operation, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner that reports each operation as it completes
pub struct Spinner {
    pb: Option<ProgressBar>,
    kind: String,
    quiet: bool,
}

impl Spinner {
    pub fn new(quiet: bool) -> Self {
        Self {
            pb: None,
            kind: String::new(),
            quiet,
        }
    }

    fn println(&self, line: String) {
        match &self.pb {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl ProgressCallback for Spinner {
    fn on_start(&mut self, kind: &str, count: usize) {
        self.kind = kind.to_string();
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(count as u64);
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{pos}/{len}] {msg}")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        self.pb = Some(pb);
    }

    fn on_operation_start(&mut self, op: &Operation) {
        if let Some(pb) = &self.pb {
            let verb = match op {
                Operation::Add(_) => "Installing",
                Operation::Remove(_) => "Removing",
            };
            pb.set_message(format!("{verb} {} {}", self.kind, op.record()));
        }
    }

    fn on_operation_complete(&mut self, op: &Operation, result: &ApplyResult) {
        let line = match result {
            ApplyResult::Added => format!("  {} {}", "+".green(), op.record()),
            ApplyResult::Removed => format!("  {} {}", "-".red(), op.record()),
            ApplyResult::Skipped { reason } => {
                format!("  {} {} {}", "⊘".dimmed(), op, format!("({reason})").dimmed())
            }
            ApplyResult::Failed { error } => {
                format!("  {} {}: {}", "✗".red(), op, error.red())
            }
        };
        if !self.quiet || !result.is_success() {
            self.println(line);
        }
        if let Some(pb) = &self.pb {
            pb.inc(1);
        }
    }

    fn on_finish(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
    }
}
