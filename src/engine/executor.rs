//! Execution engine - toolsync-specific executor with UI integration

use anyhow::Result;
use colored::Colorize;
use declarative::{ApplyOptions, ApplySummary, ChangePlan, Provider};

use crate::progress::Spinner;

/// Options for execution (includes `yes` for confirmation skip)
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Stop at the first failed operation
    pub fail_fast: bool,
    /// Only report failures
    pub quiet: bool,
}

impl ExecuteOptions {
    fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            dry_run: self.dry_run,
            fail_fast: self.fail_fast,
        }
    }
}

/// Apply one collection's plan with a spinner
pub fn execute<P>(plan: &ChangePlan, provider: &P, opts: &ExecuteOptions) -> Result<ApplySummary>
where
    P: Provider + ?Sized,
{
    let count = plan.operations().len();
    if count == 0 {
        return Ok(ApplySummary::default());
    }

    if !opts.quiet {
        println!();
        println!(
            "  {} Applying {} {} changes...",
            "→".cyan(),
            count,
            provider.kind()
        );
    }

    let mut spinner = Spinner::new(opts.quiet);
    declarative::apply_plan(plan, provider, &opts.apply_options(), &mut spinner)
}

/// Confirm with user
pub fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
pub fn print_summary(summary: &ApplySummary, dry_run: bool) {
    println!();
    if dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return;
    }

    if summary.is_success() {
        println!("  {} Toolchains converged!", "✓".green().bold());
    } else {
        println!("  {} Applied with errors", "⚠".yellow().bold());
    }

    for line in summary_lines(summary) {
        println!("    • {line}");
    }
}

fn summary_lines(summary: &ApplySummary) -> Vec<String> {
    let mut lines = Vec::new();
    if summary.added > 0 {
        lines.push(format!("{} added", summary.added));
    }
    if summary.removed > 0 {
        lines.push(format!("{} removed", summary.removed));
    }
    if summary.skipped > 0 {
        lines.push(format!("{} skipped", summary.skipped));
    }
    if summary.failed > 0 {
        lines.push(format!("{} {}", summary.failed, "failed".red()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Record, Reconciler};
    use std::cell::RefCell;

    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl Provider for Recorder {
        fn kind(&self) -> &'static str {
            "toolchain"
        }

        fn observe(&self) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }

        fn add(&self, record: &Record) -> Result<()> {
            self.calls.borrow_mut().push(format!("add {record}"));
            Ok(())
        }

        fn remove(&self, record: &Record) -> Result<()> {
            self.calls.borrow_mut().push(format!("remove {record}"));
            Ok(())
        }
    }

    fn recorder() -> Recorder {
        Recorder {
            calls: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_summary_lines_skip_zero_counts() {
        let summary = ApplySummary {
            added: 2,
            skipped: 1,
            ..Default::default()
        };
        assert_eq!(summary_lines(&summary), vec!["2 added", "1 skipped"]);
        assert!(summary_lines(&ApplySummary::default()).is_empty());
    }

    #[test]
    fn test_execute_applies_plan() {
        let plan = Reconciler::default()
            .reconcile(&[Record::titled("stable")], &[Record::titled("beta")])
            .unwrap();
        let provider = recorder();
        let opts = ExecuteOptions {
            quiet: true,
            ..Default::default()
        };

        let summary = execute(&plan, &provider, &opts).unwrap();
        assert_eq!(summary.added, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(
            *provider.calls.borrow(),
            vec!["remove beta".to_string(), "add stable".to_string()]
        );
    }

    #[test]
    fn test_execute_dry_run_touches_nothing() {
        let plan = Reconciler::default()
            .reconcile(&[Record::titled("stable")], &[])
            .unwrap();
        let provider = recorder();
        let opts = ExecuteOptions {
            dry_run: true,
            quiet: true,
            ..Default::default()
        };

        let summary = execute(&plan, &provider, &opts).unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(provider.calls.borrow().is_empty());
    }
}
