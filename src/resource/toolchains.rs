//! Installed toolchains
//!
//! Desired entries name toolchains the way rustup accepts them (`stable`,
//! `nightly-2024-01-01`, `stable-msvc`). Observed entries are the lines of
//! `rustup toolchain list`. Both sides are normalized to the fully qualified
//! name so they compare equal.

use anyhow::{Context, Result};
use declarative::{NormalizeError, Normalizer, Provider, Record, TITLE};
use toolchain::{Client, InstallOptions, InstalledToolchain, TargetTriple, ToolchainDesc};

use super::{check_ensure, reject_unknown_fields, require_title};

/// Normalizes toolchain records against a host triple
#[derive(Debug, Clone)]
pub struct ToolchainNormalizer {
    host: TargetTriple,
}

impl ToolchainNormalizer {
    pub fn new(host: TargetTriple) -> Self {
        Self { host }
    }

    /// Fully qualified form of a possibly partial toolchain name
    pub fn full_name(&self, name: &str) -> Result<String, NormalizeError> {
        let desc: ToolchainDesc = name
            .parse()
            .map_err(|e| NormalizeError::invalid_field(TITLE, e))?;
        Ok(desc.resolve(&self.host).full_name())
    }
}

impl Normalizer for ToolchainNormalizer {
    fn coerce_desired(&self, record: &mut Record) -> Result<(), NormalizeError> {
        reject_unknown_fields(record, &[])?;
        check_ensure(record)?;
        let full = self.full_name(require_title(record)?.trim())?;
        record.insert(TITLE, full);
        Ok(())
    }

    fn normalize_observed(&self, record: Record) -> Result<Option<Record>, NormalizeError> {
        let Some(line) = record.title() else {
            return Ok(None);
        };
        let Some(installed) = InstalledToolchain::parse_line(line) else {
            return Ok(None);
        };

        // Custom toolchains linked from a path may not follow rustup's naming
        match self.full_name(&installed.name) {
            Ok(full) => Ok(Some(Record::titled(full))),
            Err(e) => {
                log::debug!("ignoring installed toolchain '{}': {e}", installed.name);
                Ok(None)
            }
        }
    }
}

/// Lists, installs and uninstalls toolchains through rustup
pub struct ToolchainProvider<'a> {
    client: &'a Client,
    options: InstallOptions,
}

impl<'a> ToolchainProvider<'a> {
    pub fn new(client: &'a Client, options: InstallOptions) -> Self {
        Self { client, options }
    }
}

impl Provider for ToolchainProvider<'_> {
    fn kind(&self) -> &'static str {
        "toolchain"
    }

    fn observe(&self) -> Result<Vec<Record>> {
        Ok(self
            .client
            .toolchain_lines()?
            .into_iter()
            .map(Record::titled)
            .collect())
    }

    fn add(&self, record: &Record) -> Result<()> {
        let name = record.title().context("toolchain record has no title")?;
        self.client.install(name, &self.options)?;
        Ok(())
    }

    fn remove(&self, record: &Record) -> Result<()> {
        let name = record.title().context("toolchain record has no title")?;
        self.client.uninstall(name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{ABSENT, ENSURE, Error, Reconciler};
    use toolchain::MockBackend;

    fn host() -> TargetTriple {
        "x86_64-unknown-linux-gnu".parse().unwrap()
    }

    fn reconciler() -> Reconciler<ToolchainNormalizer> {
        Reconciler::new(ToolchainNormalizer::new(host()))
    }

    fn lines(lines: &[&str]) -> Vec<Record> {
        lines.iter().map(|l| Record::titled(*l)).collect()
    }

    #[test]
    fn test_desired_names_are_resolved() {
        let normalizer = ToolchainNormalizer::new(host());
        let record = normalizer
            .normalize_desired(Record::titled("nightly-2024-01-01"))
            .unwrap()
            .unwrap();
        assert_eq!(
            record.title(),
            Some("nightly-2024-01-01-x86_64-unknown-linux-gnu")
        );
    }

    #[test]
    fn test_default_marker_is_stripped() {
        let normalizer = ToolchainNormalizer::new(host());
        let record = normalizer
            .normalize_observed(Record::titled("stable-x86_64-unknown-linux-gnu (default)"))
            .unwrap()
            .unwrap();
        assert_eq!(record, Record::titled("stable-x86_64-unknown-linux-gnu"));
    }

    #[test]
    fn test_noise_is_skipped() {
        let normalizer = ToolchainNormalizer::new(host());
        assert!(
            normalizer
                .normalize_observed(Record::titled("no installed toolchains"))
                .unwrap()
                .is_none()
        );
        assert!(normalizer.normalize_observed(Record::new()).unwrap().is_none());
    }

    #[test]
    fn test_in_sync_with_partial_names() {
        let desired = vec![Record::titled("stable"), Record::titled("nightly-2024-01-01")];
        let observed = lines(&[
            "stable-x86_64-unknown-linux-gnu (default)",
            "nightly-2024-01-01-x86_64-unknown-linux-gnu",
        ]);
        assert!(reconciler().is_in_sync(&desired, &observed).unwrap());
    }

    #[test]
    fn test_plan_against_rustup_output() {
        let desired = vec![
            Record::titled("stable"),
            Record::titled("beta").with(ENSURE, ABSENT),
            Record::titled("nightly").with(ENSURE, ABSENT),
            Record::titled("1.75.0"),
        ];
        let observed = lines(&[
            "stable-x86_64-unknown-linux-gnu (default)",
            "beta-x86_64-unknown-linux-gnu",
            "1.70.0-x86_64-unknown-linux-gnu",
        ]);

        let plan = reconciler().reconcile(&desired, &observed).unwrap();
        let titles = |records: &[declarative::PlannedRecord]| -> Vec<String> {
            records.iter().map(|p| p.record.label()).collect()
        };

        assert_eq!(titles(&plan.to_add), vec!["1.75.0-x86_64-unknown-linux-gnu"]);
        assert_eq!(
            titles(&plan.to_remove),
            vec!["beta-x86_64-unknown-linux-gnu", "1.70.0-x86_64-unknown-linux-gnu"]
        );
        assert_eq!(titles(&plan.in_sync), vec!["stable-x86_64-unknown-linux-gnu"]);
    }

    #[test]
    fn test_empty_installation() {
        let desired = vec![Record::titled("stable")];
        let plan = reconciler()
            .reconcile(&desired, &lines(&["no installed toolchains"]))
            .unwrap();
        assert_eq!(plan.to_add.len(), 1);
        assert!(plan.to_remove.is_empty());
    }

    #[test]
    fn test_duplicate_desired_toolchains() {
        let desired = vec![
            Record::titled("stable"),
            Record::titled("stable-x86_64-unknown-linux-gnu"),
        ];
        let err = reconciler().reconcile(&desired, &[]).unwrap_err();
        assert!(matches!(err, Error::IdentityCollision { .. }));
    }

    #[test]
    fn test_unsupported_field_rejected() {
        let desired = vec![Record::titled("stable").with("profile", "minimal")];
        let err = reconciler().reconcile(&desired, &[]).unwrap_err();
        assert!(err.to_string().contains("unsupported field 'profile'"));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let desired = vec![Record::titled("-stable")];
        let err = reconciler().reconcile(&desired, &[]).unwrap_err();
        assert!(matches!(err, Error::Normalization { .. }));
    }

    #[test]
    fn test_provider_round_trip() {
        let client = Client::with_backend(Box::new(
            MockBackend::new().with_toolchain("beta-x86_64-unknown-linux-gnu"),
        ));
        let provider = ToolchainProvider::new(&client, InstallOptions::default());
        let desired = vec![Record::titled("stable")];

        let plan = reconciler()
            .reconcile(&desired, &provider.observe().unwrap())
            .unwrap();
        for op in plan.operations() {
            match op {
                declarative::Operation::Add(r) => provider.add(&r).unwrap(),
                declarative::Operation::Remove(r) => provider.remove(&r).unwrap(),
            }
        }

        assert!(client.is_installed("stable").unwrap());
        assert!(!client.is_installed("beta").unwrap());
        assert!(
            reconciler()
                .is_in_sync(&desired, &provider.observe().unwrap())
                .unwrap()
        );
    }
}
