//! Installed targets, per toolchain
//!
//! A target record is keyed by its triple and the toolchain it belongs to.
//! Entries without a `toolchain` field apply to rustup's default toolchain.
//! Each toolchain's own host target ships with the toolchain and is left
//! out on both sides.

use anyhow::{Context, Result};
use declarative::{NormalizeError, Normalizer, Provider, Record, TITLE};
use toolchain::{Client, TargetTriple, ToolchainDesc};

use super::{TOOLCHAIN, check_ensure, reject_unknown_fields, require_title};

/// Normalizes target records against a host triple and default toolchain
#[derive(Debug, Clone)]
pub struct TargetNormalizer {
    host: TargetTriple,
    default_toolchain: Option<String>,
}

impl TargetNormalizer {
    pub fn new(host: TargetTriple, default_toolchain: Option<String>) -> Self {
        Self {
            host,
            default_toolchain,
        }
    }

    /// Fully qualified toolchain a record refers to
    fn toolchain_of(&self, record: &Record) -> Result<ToolchainDesc, NormalizeError> {
        let name = match record.get(TOOLCHAIN) {
            None => self
                .default_toolchain
                .as_deref()
                .ok_or_else(|| NormalizeError::missing_field(TOOLCHAIN))?,
            Some(value) => value
                .as_str()
                .ok_or_else(|| NormalizeError::invalid_field(TOOLCHAIN, "must be a string"))?,
        };

        let desc: ToolchainDesc = name
            .trim()
            .parse()
            .map_err(|e| NormalizeError::invalid_field(TOOLCHAIN, e))?;
        Ok(desc.resolve(&self.host))
    }

    /// Toolchains the desired records refer to, in first-seen order
    ///
    /// Records whose toolchain cannot be resolved are left out; the
    /// reconciler reports them.
    pub fn toolchains(&self, desired: &[Record]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in desired {
            if let Ok(desc) = self.toolchain_of(record) {
                let name = desc.full_name();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Build the normalized record, or `None` for the toolchain's own host target
    fn normalized(&self, target: &str, toolchain: &ToolchainDesc) -> Option<Record> {
        if is_host_target(target, toolchain) {
            log::debug!(
                "'{target}' is the host target of {}, managed with the toolchain",
                toolchain.full_name()
            );
            return None;
        }
        Some(Record::titled(target).with(TOOLCHAIN, toolchain.full_name()))
    }
}

impl Normalizer for TargetNormalizer {
    fn normalize_desired(&self, record: Record) -> Result<Option<Record>, NormalizeError> {
        reject_unknown_fields(&record, &[TOOLCHAIN])?;
        check_ensure(&record)?;
        let target = require_title(&record)?.trim();
        let toolchain = self.toolchain_of(&record)?;

        Ok(self.normalized(target, &toolchain).map(|mut normalized| {
            if let Some(ensure) = record.ensure() {
                normalized.insert(declarative::ENSURE, ensure);
            }
            normalized
        }))
    }

    fn normalize_observed(&self, record: Record) -> Result<Option<Record>, NormalizeError> {
        let target = require_title(&record)?;
        let toolchain = self.toolchain_of(&record)?;
        Ok(self.normalized(target, &toolchain))
    }
}

/// Whether `target` is the triple a resolved toolchain runs on
fn is_host_target(target: &str, toolchain: &ToolchainDesc) -> bool {
    match (&toolchain.arch, &toolchain.os) {
        (Some(arch), Some(os)) => {
            let triple = TargetTriple {
                arch: arch.clone(),
                os: os.clone(),
                env: toolchain.env.clone(),
            };
            triple.to_string() == target
        }
        _ => false,
    }
}

/// Lists, adds and removes targets through rustup
pub struct TargetProvider<'a> {
    client: &'a Client,
    toolchains: Vec<String>,
}

impl<'a> TargetProvider<'a> {
    /// Observe only the targets of `toolchains`
    pub fn new(client: &'a Client, toolchains: Vec<String>) -> Self {
        Self { client, toolchains }
    }
}

impl Provider for TargetProvider<'_> {
    fn kind(&self) -> &'static str {
        "target"
    }

    fn observe(&self) -> Result<Vec<Record>> {
        let installed = self.client.installed()?;
        let mut records = Vec::new();

        for toolchain in &self.toolchains {
            if !installed.iter().any(|tc| &tc.name == toolchain) {
                log::debug!("{toolchain} is not installed, it has no targets yet");
                continue;
            }
            let targets = self
                .client
                .targets(toolchain)
                .with_context(|| format!("Failed to list targets of {toolchain}"))?;
            records.extend(
                targets
                    .into_iter()
                    .map(|t| Record::titled(t).with(TOOLCHAIN, toolchain.as_str())),
            );
        }

        Ok(records)
    }

    fn add(&self, record: &Record) -> Result<()> {
        let (toolchain, target) = parts(record)?;
        self.client.add_target(toolchain, target)?;
        Ok(())
    }

    fn remove(&self, record: &Record) -> Result<()> {
        let (toolchain, target) = parts(record)?;
        self.client.remove_target(toolchain, target)?;
        Ok(())
    }
}

fn parts(record: &Record) -> Result<(&str, &str)> {
    let toolchain = record
        .get_str(TOOLCHAIN)
        .context("target record has no toolchain")?;
    let target = record.get_str(TITLE).context("target record has no title")?;
    Ok((toolchain, target))
}
