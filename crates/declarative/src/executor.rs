//! Execution engine - applies change plans through a provider

use crate::normalize::Normalizer;
use crate::plan::{ChangePlan, Operation};
use crate::provider::{ProgressCallback, Provider};
use crate::reconcile::Reconciler;
use crate::record::Record;
use crate::types::{ApplyOptions, ApplyResult, ApplySummary};
use anyhow::{Context, Result};

/// Outcome of a full observe-reconcile-apply cycle
#[derive(Debug, Clone)]
pub struct Convergence {
    /// The plan that was computed
    pub plan: ChangePlan,
    /// What applying it did
    pub summary: ApplySummary,
}

/// Observe, reconcile and apply in one go
///
/// Reconciliation errors abort before anything is changed.
///
/// # Arguments
/// * `reconciler` - Reconciler carrying the domain's normalizer
/// * `provider` - Source of the observed collection and target of operations
/// * `desired` - Desired collection from configuration
/// * `opts` - Execution options (dry_run, fail_fast)
/// * `progress` - Progress callback
pub fn converge<N, P, C>(
    reconciler: &Reconciler<N>,
    provider: &P,
    desired: &[Record],
    opts: &ApplyOptions,
    progress: &mut C,
) -> Result<Convergence>
where
    N: Normalizer,
    P: Provider + ?Sized,
    C: ProgressCallback,
{
    let observed = provider
        .observe()
        .with_context(|| format!("Failed to list installed {}s", provider.kind()))?;
    log::debug!("observed {} {} entries", observed.len(), provider.kind());

    let plan = reconciler
        .reconcile(desired, &observed)
        .with_context(|| format!("Failed to reconcile {}s", provider.kind()))?;
    let summary = apply_plan(&plan, provider, opts, progress)?;

    Ok(Convergence { plan, summary })
}

/// Apply a plan sequentially
///
/// Removals run first, then modifications (remove then add; the add is
/// skipped when the remove fails), then additions. Failures are recorded in
/// the summary unless `fail_fast` is set.
pub fn apply_plan<P, C>(
    plan: &ChangePlan,
    provider: &P,
    opts: &ApplyOptions,
    progress: &mut C,
) -> Result<ApplySummary>
where
    P: Provider + ?Sized,
    C: ProgressCallback,
{
    let mut summary = ApplySummary::default();
    if plan.is_in_sync() {
        return Ok(summary);
    }

    progress.on_start(provider.kind(), plan.operations().len());

    for planned in &plan.to_remove {
        let op = Operation::Remove(planned.record.clone());
        run(&op, provider, opts, progress, &mut summary)?;
    }

    for modification in &plan.to_modify {
        let remove = Operation::Remove(modification.from.clone());
        let add = Operation::Add(modification.to.clone());
        if run(&remove, provider, opts, progress, &mut summary)?.is_success() {
            run(&add, provider, opts, progress, &mut summary)?;
        } else {
            let result = ApplyResult::Skipped {
                reason: format!("removing the old {} failed", provider.kind()),
            };
            progress.on_operation_start(&add);
            progress.on_operation_complete(&add, &result);
            summary.add_result(&result);
        }
    }

    for planned in &plan.to_add {
        let op = Operation::Add(planned.record.clone());
        run(&op, provider, opts, progress, &mut summary)?;
    }

    progress.on_finish();
    Ok(summary)
}

/// Run one operation and record its result
fn run<P, C>(
    op: &Operation,
    provider: &P,
    opts: &ApplyOptions,
    progress: &mut C,
    summary: &mut ApplySummary,
) -> Result<ApplyResult>
where
    P: Provider + ?Sized,
    C: ProgressCallback,
{
    progress.on_operation_start(op);

    let result = if opts.dry_run {
        ApplyResult::Skipped {
            reason: "Dry run".into(),
        }
    } else {
        log::info!("{} {} {}", op.verb(), provider.kind(), op.record());
        let outcome = match op {
            Operation::Add(record) => provider.add(record).map(|()| ApplyResult::Added),
            Operation::Remove(record) => provider.remove(record).map(|()| ApplyResult::Removed),
        };
        match outcome {
            Ok(result) => result,
            Err(e) if opts.fail_fast => {
                return Err(e.context(format!(
                    "Failed to {} {} {}",
                    op.verb(),
                    provider.kind(),
                    op.record()
                )));
            }
            Err(e) => {
                log::warn!("{} {} {} failed: {:#}", op.verb(), provider.kind(), op.record(), e);
                ApplyResult::Failed {
                    error: format!("{e:#}"),
                }
            }
        }
    };

    progress.on_operation_complete(op, &result);
    summary.add_result(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::KeyedNormalizer;
    use crate::provider::NoProgress;
    use crate::record::{ABSENT, ENSURE};
    use std::cell::RefCell;

    /// In-memory provider that records every call
    #[derive(Default)]
    struct MockProvider {
        installed: RefCell<Vec<Record>>,
        calls: RefCell<Vec<String>>,
        failing: Vec<String>,
    }

    impl MockProvider {
        fn with(installed: Vec<Record>) -> Self {
            Self {
                installed: RefCell::new(installed),
                ..Default::default()
            }
        }

        fn fail_on(mut self, title: &str) -> Self {
            self.failing.push(title.to_string());
            self
        }

        fn check(&self, record: &Record) -> Result<()> {
            match record.title() {
                Some(t) if self.failing.iter().any(|f| f == t) => anyhow::bail!("cannot touch {t}"),
                _ => Ok(()),
            }
        }
    }

    impl Provider for MockProvider {
        fn kind(&self) -> &'static str {
            "item"
        }

        fn observe(&self) -> Result<Vec<Record>> {
            Ok(self.installed.borrow().clone())
        }

        fn add(&self, record: &Record) -> Result<()> {
            self.calls.borrow_mut().push(format!("add {record}"));
            self.check(record)?;
            self.installed.borrow_mut().push(record.without(ENSURE));
            Ok(())
        }

        fn remove(&self, record: &Record) -> Result<()> {
            self.calls.borrow_mut().push(format!("remove {record}"));
            self.check(record)?;
            self.installed
                .borrow_mut()
                .retain(|r| r.title() != record.title());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recording {
        started: Option<usize>,
        completed: Vec<ApplyResult>,
        events: Vec<String>,
        finished: bool,
    }

    impl ProgressCallback for Recording {
        fn on_start(&mut self, _kind: &str, count: usize) {
            self.started = Some(count);
        }
        fn on_operation_start(&mut self, op: &Operation) {
            self.events.push(format!("start {} {}", op.verb(), op.record()));
        }
        fn on_operation_complete(&mut self, op: &Operation, result: &ApplyResult) {
            self.events.push(format!("done {} {}", op.verb(), op.record()));
            self.completed.push(result.clone());
        }
        fn on_finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_converge_in_sync_does_nothing() {
        let provider = MockProvider::with(vec![Record::titled("stable")]);
        let desired = [Record::titled("stable")];
        let outcome = converge(
            &Reconciler::default(),
            &provider,
            &desired,
            &ApplyOptions::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert!(outcome.plan.is_in_sync());
        assert_eq!(outcome.summary.total(), 0);
        assert!(provider.calls.borrow().is_empty());
    }

    #[test]
    fn test_converge_applies_removals_before_additions() {
        let provider = MockProvider::with(vec![Record::titled("beta")]);
        let desired = [Record::titled("stable"), Record::titled("beta").with(ENSURE, ABSENT)];
        let mut progress = Recording::default();
        let outcome = converge(
            &Reconciler::default(),
            &provider,
            &desired,
            &ApplyOptions::default(),
            &mut progress,
        )
        .unwrap();

        assert_eq!(*provider.calls.borrow(), vec!["remove beta", "add stable"]);
        assert_eq!(outcome.summary.added, 1);
        assert_eq!(outcome.summary.removed, 1);
        assert_eq!(progress.started, Some(2));
        assert!(progress.finished);

        let again = Reconciler::default()
            .reconcile(&desired, &provider.observe().unwrap())
            .unwrap();
        assert!(again.is_in_sync());
    }

    #[test]
    fn test_dry_run_skips_everything() {
        let provider = MockProvider::with(vec![Record::titled("beta")]);
        let opts = ApplyOptions {
            dry_run: true,
            ..Default::default()
        };
        let outcome = converge(
            &Reconciler::default(),
            &provider,
            &[Record::titled("stable")],
            &opts,
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(outcome.summary.skipped, 2);
        assert_eq!(outcome.summary.total_changes(), 0);
        assert!(provider.calls.borrow().is_empty());
    }

    #[test]
    fn test_failures_are_recorded() {
        let provider = MockProvider::default().fail_on("nightly");
        let desired = [Record::titled("nightly"), Record::titled("stable")];
        let outcome = converge(
            &Reconciler::default(),
            &provider,
            &desired,
            &ApplyOptions::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.added, 1);
        assert!(!outcome.summary.is_success());
    }

    #[test]
    fn test_fail_fast_stops() {
        let provider = MockProvider::default().fail_on("nightly");
        let desired = [Record::titled("nightly"), Record::titled("stable")];
        let opts = ApplyOptions {
            fail_fast: true,
            ..Default::default()
        };
        let err = converge(&Reconciler::default(), &provider, &desired, &opts, &mut NoProgress)
            .unwrap_err();

        assert!(format!("{err:#}").contains("cannot touch nightly"));
        assert_eq!(*provider.calls.borrow(), vec!["add nightly"]);
    }

    #[test]
    fn test_modification_is_remove_then_add() {
        let provider =
            MockProvider::with(vec![Record::titled("nightly").with("profile", "minimal")]);
        let desired = [Record::titled("nightly").with("profile", "complete")];
        let outcome = converge(
            &Reconciler::new(KeyedNormalizer::by_title()),
            &provider,
            &desired,
            &ApplyOptions::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(outcome.plan.to_modify.len(), 1);
        assert_eq!(*provider.calls.borrow(), vec!["remove nightly", "add nightly"]);
        assert_eq!(
            provider.installed.borrow()[0].get_str("profile"),
            Some("complete")
        );
    }

    #[test]
    fn test_failed_removal_skips_replacement() {
        let provider = MockProvider::with(vec![Record::titled("nightly").with("profile", "minimal")])
            .fail_on("nightly");
        let desired = [Record::titled("nightly").with("profile", "complete")];
        let mut progress = Recording::default();
        let outcome = converge(
            &Reconciler::new(KeyedNormalizer::by_title()),
            &provider,
            &desired,
            &ApplyOptions::default(),
            &mut progress,
        )
        .unwrap();

        assert_eq!(outcome.summary.failed, 1);
        assert_eq!(outcome.summary.skipped, 1);
        assert_eq!(*provider.calls.borrow(), vec!["remove nightly"]);
        assert_eq!(progress.completed.len(), 2);
        assert!(matches!(progress.completed[1], ApplyResult::Skipped { .. }));
    }

    #[test]
    fn test_skipped_replacement_is_started_before_completed() {
        let provider = MockProvider::with(vec![Record::titled("nightly").with("profile", "minimal")])
            .fail_on("nightly");
        let desired = [Record::titled("nightly").with("profile", "complete")];
        let mut progress = Recording::default();
        converge(
            &Reconciler::new(KeyedNormalizer::by_title()),
            &provider,
            &desired,
            &ApplyOptions::default(),
            &mut progress,
        )
        .unwrap();

        let events: Vec<&str> = progress
            .events
            .iter()
            .map(|e| e.split(' ').next().unwrap_or(""))
            .collect();
        assert_eq!(events, vec!["start", "done", "start", "done"]);
        assert!(progress.events[2].starts_with("start add"));
        assert!(progress.events[3].starts_with("done add"));
    }

    #[test]
    fn test_reconcile_error_aborts_before_changes() {
        let provider = MockProvider::default();
        let desired = [Record::titled("stable"), Record::titled("stable")];
        let result = converge(
            &Reconciler::default(),
            &provider,
            &desired,
            &ApplyOptions::default(),
            &mut NoProgress,
        );

        assert!(result.is_err());
        assert!(provider.calls.borrow().is_empty());
    }
}
