//! Declarative commands
//!
//! - `status` - Show installed state vs the config
//! - `diff` - Preview what apply would change
//! - `apply` - Make the installation match the config
//!
//! Toolchains are always handled first, then rustup's default toolchain, then
//! targets: adding a target needs its toolchain, and targets without a
//! `toolchain` field belong to the default, so targets are re-planned once
//! the others have changed.

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use declarative::{
    ABSENT, ApplyResult, ApplySummary, ChangePlan, PlanSummary, Provider, Reconciler, Record,
};
use serde::Serialize;
use std::path::Path;
use toolchain::Client;
use toolchain::backend::rustup::RustupBackend;

use crate::Context;
use crate::cli::ResourceKind;
use crate::config::Config;
use crate::engine::differ::{self, DiffLine};
use crate::engine::{self, ExecuteOptions};
use crate::resource::{TargetNormalizer, TargetProvider, ToolchainNormalizer, ToolchainProvider};
use crate::ui;

/// Loaded config plus a client for the installation it describes
pub struct Session {
    config: Config,
    client: Client,
}

/// rustup's default toolchain, as configured and as installed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultToolchain {
    pub current: Option<String>,
    pub desired: String,
}

impl DefaultToolchain {
    pub fn is_in_sync(&self) -> bool {
        self.current.as_deref() == Some(self.desired.as_str())
    }
}

/// Plans for the selected collections
#[derive(Debug, Default, Serialize)]
pub struct Plans {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchains: Option<ChangePlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_toolchain: Option<DefaultToolchain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<ChangePlan>,
}

impl Plans {
    fn summary(&self) -> PlanSummary {
        let mut total = PlanSummary::default();
        for plan in self.toolchains.iter().chain(&self.targets) {
            total.merge(&plan.summary());
        }
        if let Some(default) = &self.default_toolchain {
            if default.is_in_sync() {
                total.unchanged += 1;
            } else {
                total.modifications += 1;
            }
        }
        total
    }

    fn is_in_sync(&self) -> bool {
        self.toolchains.iter().chain(&self.targets).all(ChangePlan::is_in_sync)
            && self
                .default_toolchain
                .as_ref()
                .is_none_or(DefaultToolchain::is_in_sync)
    }

    fn display(&self) {
        let mut sections: Vec<(&str, Vec<DiffLine>)> = Vec::new();
        if let Some(plan) = &self.toolchains {
            sections.push(("Toolchains", differ::describe(plan)));
        }
        if let Some(default) = self.default_toolchain.as_ref().filter(|d| !d.is_in_sync()) {
            sections.push((
                "Default",
                vec![differ::default_line(default.current.as_deref(), &default.desired)],
            ));
        }
        if let Some(plan) = &self.targets {
            sections.push(("Targets", differ::describe(plan)));
        }
        engine::display_diff(&sections, &self.summary());
    }
}

impl Session {
    /// Load the config and connect to rustup
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let (config, path) = Config::load(config_path)?;
        log::info!("Using config {}", path.display());

        let mut backend = RustupBackend::new()?;
        if let Some(home) = config.rustup.home_path() {
            log::debug!("RUSTUP_HOME={}", home.display());
            backend = backend.rustup_home(home);
        }

        let client = Client::with_backend(Box::new(backend));
        Self::with_client(config, client)
    }

    /// Use an already built client
    pub fn with_client(config: Config, mut client: Client) -> Result<Self> {
        if let Some(host) = &config.rustup.default_host {
            let host = host
                .parse()
                .with_context(|| format!("Invalid default_host '{host}' in [rustup]"))?;
            client = client.with_host(host);
        }
        Ok(Self { config, client })
    }

    /// Full name of rustup's current default toolchain, if one is set
    fn current_default(&self) -> Result<Option<String>> {
        let Some(default) = self.client.default_toolchain()? else {
            return Ok(None);
        };
        match self.client.resolve(&default.name) {
            Ok(desc) => Ok(Some(desc.full_name())),
            Err(e) => {
                log::debug!("default toolchain '{}' not resolvable: {e}", default.name);
                Ok(Some(default.name))
            }
        }
    }

    /// Full name of the configured default toolchain
    fn desired_default(&self) -> Result<Option<String>> {
        let Some(name) = &self.config.rustup.default_toolchain else {
            return Ok(None);
        };
        let desc = self
            .client
            .resolve(name.trim())
            .with_context(|| format!("Invalid default_toolchain '{name}' in [rustup]"))?;
        Ok(Some(desc.full_name()))
    }

    /// Plan for rustup's default toolchain, when the config declares one
    pub fn default_plan(&self) -> Result<Option<DefaultToolchain>> {
        let Some(desired) = self.desired_default()? else {
            return Ok(None);
        };
        Ok(Some(DefaultToolchain {
            current: self.current_default()?,
            desired,
        }))
    }

    /// Desired toolchains, including the declared default
    fn desired_toolchains(&self) -> Result<Vec<Record>> {
        let mut desired = self.config.toolchain_records();
        let Some(default) = self.desired_default()? else {
            return Ok(desired);
        };

        let normalizer = ToolchainNormalizer::new(self.client.host()?);
        let listed = desired.iter().find(|record| {
            record
                .title()
                .and_then(|title| normalizer.full_name(title.trim()).ok())
                .is_some_and(|full| full == default)
        });
        match listed {
            Some(record) if record.ensure() == Some(ABSENT) => {
                anyhow::bail!("default_toolchain '{default}' is marked absent in toolchains")
            }
            Some(_) => {}
            None => {
                log::debug!("adding default toolchain {default} to the desired toolchains");
                desired.push(Record::titled(default));
            }
        }
        Ok(desired)
    }

    fn toolchain_reconciler(&self) -> Result<Reconciler<ToolchainNormalizer>> {
        Ok(
            Reconciler::new(ToolchainNormalizer::new(self.client.host()?))
                .with_options(self.config.rustup.reconcile_options()),
        )
    }

    /// Targets without a toolchain go to the declared default, else the current one
    fn target_reconciler(&self) -> Result<Reconciler<TargetNormalizer>> {
        let default = match self.desired_default()? {
            Some(default) => Some(default),
            None => self.current_default()?,
        };
        let normalizer = TargetNormalizer::new(self.client.host()?, default);
        Ok(Reconciler::new(normalizer).with_options(self.config.rustup.reconcile_options()))
    }

    fn toolchain_provider(&self) -> ToolchainProvider<'_> {
        ToolchainProvider::new(&self.client, self.config.rustup.install_options())
    }

    /// Plan the toolchain collection
    pub fn toolchain_plan(&self) -> Result<ChangePlan> {
        let desired = self.desired_toolchains()?;
        let observed = self.toolchain_provider().observe()?;
        self.toolchain_reconciler()?
            .reconcile(&desired, &observed)
            .context("Failed to reconcile toolchains")
    }

    /// Plan the target collection
    pub fn target_plan(&self) -> Result<ChangePlan> {
        let desired = self.config.target_records();
        let reconciler = self.target_reconciler()?;
        let provider =
            TargetProvider::new(&self.client, reconciler.normalizer().toolchains(&desired));
        let observed = provider.observe()?;
        reconciler
            .reconcile(&desired, &observed)
            .context("Failed to reconcile targets")
    }

    /// Plan every selected collection
    ///
    /// The default toolchain goes with the toolchains.
    pub fn plans(&self, kind: Option<ResourceKind>) -> Result<Plans> {
        let mut plans = Plans::default();
        if ResourceKind::Toolchains.selected(kind) {
            plans.toolchains = Some(self.toolchain_plan()?);
            plans.default_toolchain = self.default_plan()?;
        }
        if ResourceKind::Targets.selected(kind) {
            plans.targets = Some(self.target_plan()?);
        }
        Ok(plans)
    }

    fn apply_toolchains(&self, plan: &ChangePlan, opts: &ExecuteOptions) -> Result<ApplySummary> {
        engine::execute(plan, &self.toolchain_provider(), opts)
    }

    /// Switch rustup's default toolchain if it differs from the config
    fn apply_default(&self, opts: &ExecuteOptions) -> Result<ApplySummary> {
        let mut summary = ApplySummary::default();
        let Some(default) = self.default_plan()? else {
            return Ok(summary);
        };
        if default.is_in_sync() {
            return Ok(summary);
        }

        let result = if opts.dry_run {
            ApplyResult::Skipped {
                reason: "Dry run".into(),
            }
        } else {
            log::info!("setting default toolchain {}", default.desired);
            match self.client.set_default(&default.desired) {
                Ok(()) => ApplyResult::Added,
                Err(e) if opts.fail_fast => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("Failed to set default toolchain {}", default.desired)));
                }
                Err(e) => {
                    log::warn!("setting default toolchain {} failed: {e}", default.desired);
                    ApplyResult::Failed {
                        error: e.to_string(),
                    }
                }
            }
        };

        match &result {
            ApplyResult::Failed { error } => {
                println!("  {} default {}: {}", "✗".red(), default.desired, error.red());
            }
            _ if !opts.quiet => println!("  {} default {}", "~".yellow(), default.desired),
            _ => {}
        }
        summary.add_result(&result);
        Ok(summary)
    }

    fn apply_targets(&self, opts: &ExecuteOptions) -> Result<ApplySummary> {
        let desired = self.config.target_records();
        let reconciler = self.target_reconciler()?;
        let provider =
            TargetProvider::new(&self.client, reconciler.normalizer().toolchains(&desired));
        let observed = provider.observe()?;
        let plan = reconciler
            .reconcile(&desired, &observed)
            .context("Failed to reconcile targets")?;
        engine::execute(&plan, &provider, opts)
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Show the state of each collection; returns whether everything is in sync
pub fn status(ctx: &Context, config: Option<&Path>, kind: Option<ResourceKind>) -> Result<bool> {
    let session = Session::open(config)?;
    let plans = session.plans(kind)?;

    if !ctx.quiet {
        ui::header("Toolchain Status");
        if let Some(plan) = &plans.toolchains {
            show_status("Toolchains", plan);
        }
        if let Some(default) = &plans.default_toolchain {
            show_default(default);
        }
        if let Some(plan) = &plans.targets {
            show_status("Targets", plan);
        }

        let summary = plans.summary();
        println!();
        if plans.is_in_sync() {
            ui::success(&format!("In sync ({} unchanged)", summary.unchanged));
        } else {
            ui::warn(&format!(
                "{} pending, run {} to fix",
                ui::plural(summary.total(), "change"),
                "toolsync apply".bold()
            ));
        }
    }

    Ok(plans.is_in_sync())
}

fn show_status(title: &str, plan: &ChangePlan) {
    ui::section(title);

    if plan.in_sync.is_empty() && !plan.summary().has_changes() {
        ui::dim("nothing configured");
        return;
    }

    for planned in &plan.in_sync {
        println!("  {} {}", "✓".green(), engine::differ::label(&planned.record));
    }
    for planned in &plan.to_add {
        println!(
            "  {} {} {}",
            "✗".red(),
            engine::differ::label(&planned.record),
            "(missing)".dimmed()
        );
    }
    for m in &plan.to_modify {
        println!(
            "  {} {} {}",
            "~".yellow(),
            engine::differ::label(&m.to),
            "(differs)".dimmed()
        );
    }
    for planned in &plan.to_remove {
        println!(
            "  {} {} {}",
            "⚠".yellow(),
            engine::differ::label(&planned.record),
            "(to remove)".dimmed()
        );
    }
}

fn show_default(default: &DefaultToolchain) {
    ui::section("Default");
    if default.is_in_sync() {
        println!("  {} {}", "✓".green(), default.desired);
    } else {
        println!(
            "  {} {} {}",
            "~".yellow(),
            default.desired,
            format!("(currently {})", default.current.as_deref().unwrap_or("none")).dimmed()
        );
    }
}

/// Show what apply would change
pub fn diff(config: Option<&Path>, kind: Option<ResourceKind>, json: bool) -> Result<()> {
    let session = Session::open(config)?;
    let plans = session.plans(kind)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
    } else {
        plans.display();
    }
    Ok(())
}

/// Converge the installation on the config
pub fn apply(
    ctx: &Context,
    config: Option<&Path>,
    kind: Option<ResourceKind>,
    opts: &ExecuteOptions,
) -> Result<()> {
    let session = Session::open(config)?;
    let summary = run_apply(&session, kind, opts, !opts.yes && !opts.dry_run)?;

    if !ctx.quiet || !summary.is_success() {
        engine::print_summary(&summary, opts.dry_run);
    }

    if summary.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{} failed", ui::plural(summary.failed, "operation"))
    }
}

fn run_apply(
    session: &Session,
    kind: Option<ResourceKind>,
    opts: &ExecuteOptions,
    confirm: bool,
) -> Result<ApplySummary> {
    let mut plans = Plans::default();
    if ResourceKind::Toolchains.selected(kind) {
        plans.toolchains = Some(session.toolchain_plan()?);
        plans.default_toolchain = session.default_plan()?;
    }

    // Targets of a toolchain that is about to be installed can only be
    // planned once it exists
    let toolchains_pending = plans.toolchains.as_ref().is_some_and(|p| !p.is_in_sync());
    let mut targets_deferred = false;
    if ResourceKind::Targets.selected(kind) {
        match session.target_plan() {
            Ok(plan) => plans.targets = Some(plan),
            Err(e) if toolchains_pending => {
                log::info!("deferring target planning: {e:#}");
                targets_deferred = true;
            }
            Err(e) => return Err(e),
        }
    }

    plans.display();
    if targets_deferred {
        ui::info("Targets will be planned once the toolchains are installed");
    }

    if (plans.is_in_sync() && !targets_deferred) || opts.dry_run {
        return Ok(ApplySummary::default());
    }

    if confirm && !engine::confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(ApplySummary {
            skipped: plans.summary().total(),
            ..Default::default()
        });
    }

    let mut summary = ApplySummary::default();
    if let Some(plan) = &plans.toolchains {
        summary.merge(&session.apply_toolchains(plan, opts)?);
        summary.merge(&session.apply_default(opts)?);
    }
    if plans.targets.is_some() || targets_deferred {
        summary.merge(&session.apply_targets(opts)?);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Entry;
    use declarative::ENSURE;
    use toolchain::MockBackend;

    fn config(toolchains: Vec<Entry>, targets: Vec<Entry>) -> Config {
        Config {
            toolchains,
            targets,
            ..Default::default()
        }
    }

    fn session(config: Config, backend: MockBackend) -> Session {
        Session::with_client(config, Client::with_backend(Box::new(backend))).unwrap()
    }

    fn with_default(mut config: Config, name: &str) -> Config {
        config.rustup.default_toolchain = Some(name.to_string());
        config
    }

    fn quiet() -> ExecuteOptions {
        ExecuteOptions {
            quiet: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_targets_need_a_default_toolchain() {
        let s = session(
            config(Vec::new(), vec![Entry::Title("wasm32-unknown-unknown".into())]),
            MockBackend::new(),
        );
        let err = s.target_plan().unwrap_err();
        assert!(format!("{err:#}").contains("missing required field 'toolchain'"));
    }

    #[test]
    fn test_fresh_install_applies_toolchains_then_targets() {
        let backend = MockBackend::new();
        let s = session(
            config(
                vec![Entry::Title("stable".into())],
                vec![Entry::Title("wasm32-unknown-unknown".into())],
            ),
            backend.clone(),
        );

        let summary = run_apply(&s, None, &quiet(), false).unwrap();
        assert_eq!(summary.added, 2);
        assert!(s.plans(None).unwrap().is_in_sync());
        assert_eq!(
            backend.calls(),
            vec![
                "toolchain install stable-x86_64-unknown-linux-gnu".to_string(),
                "target add --toolchain stable-x86_64-unknown-linux-gnu wasm32-unknown-unknown"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_apply_failure_is_reported() {
        let backend = MockBackend::new().failing_on("nightly-x86_64-unknown-linux-gnu");
        let s = session(
            config(vec![Entry::Title("nightly".into())], Vec::new()),
            backend,
        );
        let summary = run_apply(&s, None, &quiet(), false).unwrap();
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_kind_filter() {
        let s = session(
            config(vec![Entry::Title("stable".into())], Vec::new()),
            MockBackend::new(),
        );
        let plans = s.plans(Some(ResourceKind::Toolchains)).unwrap();
        assert!(plans.toolchains.is_some());
        assert!(plans.targets.is_none());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let backend = MockBackend::new().with_toolchain("beta-x86_64-unknown-linux-gnu (default)");
        let s = session(
            config(
                vec![Entry::Record(
                    Record::titled("beta").with(ENSURE, ABSENT),
                )],
                Vec::new(),
            ),
            backend.clone(),
        );
        let opts = ExecuteOptions {
            dry_run: true,
            quiet: true,
            ..Default::default()
        };

        let summary = run_apply(&s, None, &opts, false).unwrap();
        assert_eq!(summary.total(), 0);
        assert!(backend.calls().is_empty());
        assert_eq!(s.toolchain_plan().unwrap().to_remove.len(), 1);
    }

    #[test]
    fn test_default_host_override() {
        let mut cfg = config(vec![Entry::Title("stable".into())], Vec::new());
        cfg.rustup.default_host = Some("aarch64-apple-darwin".into());
        let s = session(
            cfg,
            MockBackend::new().with_toolchain("stable-aarch64-apple-darwin (default)"),
        );
        assert!(s.toolchain_plan().unwrap().is_in_sync());
        assert_eq!(
            s.current_default().unwrap().as_deref(),
            Some("stable-aarch64-apple-darwin")
        );
    }

    #[test]
    fn test_invalid_default_host() {
        let mut cfg = Config::default();
        cfg.rustup.default_host = Some("not a triple".into());
        let result = Session::with_client(cfg, Client::with_backend(Box::new(MockBackend::new())));
        assert!(result.is_err());
    }

    #[test]
    fn test_plans_serialize_selected_only() {
        let s = session(
            config(vec![Entry::Title("stable".into())], Vec::new()),
            MockBackend::new(),
        );
        let json =
            serde_json::to_value(s.plans(Some(ResourceKind::Toolchains)).unwrap()).unwrap();
        assert!(json.get("toolchains").is_some());
        assert!(json.get("targets").is_none());
    }

    #[test]
    fn test_default_toolchain_set_after_toolchains() {
        let backend = MockBackend::new().with_toolchain("stable-x86_64-unknown-linux-gnu (default)");
        let s = session(
            with_default(
                config(
                    vec![Entry::Title("stable".into()), Entry::Title("nightly".into())],
                    Vec::new(),
                ),
                "nightly",
            ),
            backend.clone(),
        );

        let plans = s.plans(None).unwrap();
        assert_eq!(
            plans.default_toolchain,
            Some(DefaultToolchain {
                current: Some("stable-x86_64-unknown-linux-gnu".into()),
                desired: "nightly-x86_64-unknown-linux-gnu".into(),
            })
        );
        assert_eq!(plans.summary().modifications, 1);

        let summary = run_apply(&s, None, &quiet(), false).unwrap();
        assert_eq!(summary.added, 2);
        assert_eq!(
            backend.calls(),
            vec![
                "toolchain install nightly-x86_64-unknown-linux-gnu".to_string(),
                "default nightly-x86_64-unknown-linux-gnu".to_string(),
            ]
        );

        let plans = s.plans(None).unwrap();
        assert!(plans.is_in_sync());
        assert_eq!(plans.summary().unchanged, 3);
    }

    #[test]
    fn test_target_planning_uses_declared_default() {
        let backend = MockBackend::new()
            .with_toolchain("stable-x86_64-unknown-linux-gnu (default)")
            .with_toolchain("nightly-x86_64-unknown-linux-gnu");
        let s = session(
            with_default(
                config(
                    vec![Entry::Title("stable".into()), Entry::Title("nightly".into())],
                    vec![Entry::Title("wasm32-unknown-unknown".into())],
                ),
                "nightly",
            ),
            backend.clone(),
        );

        let plan = s.target_plan().unwrap();
        assert_eq!(plan.to_add.len(), 1);
        assert_eq!(
            plan.to_add[0].record.get_str(crate::resource::TOOLCHAIN),
            Some("nightly-x86_64-unknown-linux-gnu")
        );

        run_apply(&s, None, &quiet(), false).unwrap();
        assert_eq!(
            backend.calls().last().map(String::as_str),
            Some("target add --toolchain nightly-x86_64-unknown-linux-gnu wasm32-unknown-unknown")
        );
    }

    #[test]
    fn test_declared_default_joins_desired_toolchains() {
        let s = session(with_default(Config::default(), "beta"), MockBackend::new());
        let plan = s.toolchain_plan().unwrap();
        assert_eq!(plan.to_add.len(), 1);
        assert_eq!(
            plan.to_add[0].record.title(),
            Some("beta-x86_64-unknown-linux-gnu")
        );
    }

    #[test]
    fn test_declared_default_marked_absent() {
        let s = session(
            with_default(
                config(
                    vec![Entry::Record(Record::titled("beta").with(ENSURE, ABSENT))],
                    Vec::new(),
                ),
                "beta",
            ),
            MockBackend::new(),
        );
        let err = s.toolchain_plan().unwrap_err();
        assert!(err.to_string().contains("marked absent"));
    }

    #[test]
    fn test_default_dry_run_and_json() {
        let backend = MockBackend::new()
            .with_toolchain("stable-x86_64-unknown-linux-gnu (default)")
            .with_toolchain("beta-x86_64-unknown-linux-gnu");
        let s = session(
            with_default(
                config(
                    vec![Entry::Title("stable".into()), Entry::Title("beta".into())],
                    Vec::new(),
                ),
                "beta",
            ),
            backend.clone(),
        );
        let opts = ExecuteOptions {
            dry_run: true,
            quiet: true,
            ..Default::default()
        };

        assert_eq!(s.apply_default(&opts).unwrap().skipped, 1);
        assert!(backend.calls().is_empty());

        let json = serde_json::to_value(s.plans(Some(ResourceKind::Toolchains)).unwrap()).unwrap();
        assert_eq!(
            json["default_toolchain"]["desired"],
            "beta-x86_64-unknown-linux-gnu"
        );
    }

    #[test]
    fn test_default_failure_is_counted() {
        let backend = MockBackend::new()
            .with_toolchain("stable-x86_64-unknown-linux-gnu (default)")
            .with_toolchain("beta-x86_64-unknown-linux-gnu")
            .failing_on("beta-x86_64-unknown-linux-gnu");
        let s = session(
            with_default(
                config(
                    vec![Entry::Title("stable".into()), Entry::Title("beta".into())],
                    Vec::new(),
                ),
                "beta",
            ),
            backend,
        );

        assert_eq!(s.apply_default(&quiet()).unwrap().failed, 1);
        let opts = ExecuteOptions {
            fail_fast: true,
            quiet: true,
            ..Default::default()
        };
        assert!(s.apply_default(&opts).is_err());
    }
}
