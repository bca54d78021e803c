//! Plan display - toolsync-specific UI

use colored::Colorize;
use declarative::{ChangePlan, PlanSummary, Record, TITLE};

use crate::resource::TOOLCHAIN;

/// Kind of change a diff line shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Add,
    Remove,
    Modify,
}

impl Change {
    fn symbol(self) -> colored::ColoredString {
        match self {
            Self::Add => "+".green(),
            Self::Remove => "-".red(),
            Self::Modify => "~".yellow(),
        }
    }
}

/// One line of a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub change: Change,
    pub label: String,
    pub detail: String,
}

/// How a record is named in output
pub fn label(record: &Record) -> String {
    match record.get_str(TOOLCHAIN) {
        Some(toolchain) => format!("{record} ({toolchain})"),
        None => record.to_string(),
    }
}

/// Flatten a plan into display lines: removals, modifications, additions
pub fn describe(plan: &ChangePlan) -> Vec<DiffLine> {
    let mut lines = Vec::new();

    for planned in &plan.to_remove {
        lines.push(DiffLine {
            change: Change::Remove,
            label: label(&planned.record),
            detail: "(will remove)".to_string(),
        });
    }

    for m in &plan.to_modify {
        lines.push(DiffLine {
            change: Change::Modify,
            label: label(&m.to),
            detail: format!("{} → {}", m.from.without(TITLE), m.to.without(TITLE)),
        });
    }

    for planned in &plan.to_add {
        lines.push(DiffLine {
            change: Change::Add,
            label: label(&planned.record),
            detail: "(not installed)".to_string(),
        });
    }

    lines
}

/// Line for a change of rustup's default toolchain
pub fn default_line(current: Option<&str>, desired: &str) -> DiffLine {
    DiffLine {
        change: Change::Modify,
        label: "default toolchain".to_string(),
        detail: format!("{} → {desired}", current.unwrap_or("(none)")),
    }
}

/// Display titled groups of diff lines in one box
pub fn display_diff(sections: &[(&str, Vec<DiffLine>)], total: &PlanSummary) {
    if !total.has_changes() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Toolchain Diff".bold()
    );
    println!("│");

    for (title, lines) in sections {
        if lines.is_empty() {
            continue;
        }

        println!("│ {}", title.bold());
        for line in lines {
            println!(
                "│   {} {:<40} {}",
                line.change.symbol(),
                line.label,
                line.detail.dimmed()
            );
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to add, {} to remove, {} to modify, {} unchanged",
        total.additions.to_string().green(),
        total.removals.to_string().red(),
        total.modifications.to_string().yellow(),
        total.unchanged
    );
    println!("└─────────────────────────────────────────────────────┘");
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Identity, Modification, PlannedRecord};

    fn planned(record: Record) -> PlannedRecord {
        PlannedRecord {
            identity: Identity::of(&record),
            record,
        }
    }

    #[test]
    fn test_label_with_toolchain() {
        let record = Record::titled("wasm32-unknown-unknown").with(TOOLCHAIN, "stable");
        assert_eq!(label(&record), "wasm32-unknown-unknown (stable)");
        assert_eq!(label(&Record::titled("stable")), "stable");
    }

    #[test]
    fn test_describe_order() {
        let to = Record::titled("x").with("channel", "beta");
        let plan = ChangePlan {
            to_add: vec![planned(Record::titled("nightly"))],
            to_remove: vec![planned(Record::titled("beta"))],
            to_modify: vec![Modification {
                identity: Identity::of(&to),
                from: Record::titled("x").with("channel", "stable"),
                to,
            }],
            in_sync: vec![planned(Record::titled("stable"))],
        };

        let lines = describe(&plan);
        let changes: Vec<Change> = lines.iter().map(|l| l.change).collect();
        assert_eq!(changes, vec![Change::Remove, Change::Modify, Change::Add]);
        assert_eq!(lines[0].label, "beta");
        assert_eq!(lines[1].detail, r#"{"channel":"stable"} → {"channel":"beta"}"#);
        assert_eq!(lines[2].label, "nightly");
    }

    #[test]
    fn test_default_line() {
        let line = default_line(Some("stable-x86_64-unknown-linux-gnu"), "nightly-x86_64-unknown-linux-gnu");
        assert_eq!(line.change, Change::Modify);
        assert_eq!(
            line.detail,
            "stable-x86_64-unknown-linux-gnu → nightly-x86_64-unknown-linux-gnu"
        );
        assert_eq!(default_line(None, "stable").detail, "(none) → stable");
    }

    #[test]
    fn test_describe_in_sync_is_empty() {
        let plan = ChangePlan {
            in_sync: vec![planned(Record::titled("stable"))],
            ..Default::default()
        };
        assert!(describe(&plan).is_empty());
    }
}
