use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "toolsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Keep rustup toolchains and targets in line with a config file", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the one in the config directory
    #[arg(short, long, global = true, env = "TOOLSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show whether installed toolchains and targets match the config
    ///
    /// Exits with status 1 when anything has drifted.
    Status(StatusArgs),

    /// Preview what apply would change
    Diff(DiffArgs),

    /// Install and remove toolchains and targets to match the config
    Apply(ApplyArgs),

    /// Print the pattern used to find a toolchain in `rustup toolchain list`
    Matcher(MatcherArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Which collection a command works on
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    Toolchains,
    Targets,
}

#[derive(Debug, clap::Args)]
pub struct StatusArgs {
    /// Only check one collection
    #[arg(value_enum)]
    pub kind: Option<ResourceKind>,
}

#[derive(Debug, clap::Args)]
pub struct DiffArgs {
    /// Only diff one collection
    #[arg(value_enum)]
    pub kind: Option<ResourceKind>,

    /// Print the plans as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args)]
pub struct ApplyArgs {
    /// Only apply one collection
    #[arg(value_enum)]
    pub kind: Option<ResourceKind>,

    /// Show what would be done without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Don't ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Stop at the first failed operation
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Debug, clap::Args)]
pub struct MatcherArgs {
    /// Toolchain name, full or partial (e.g. `stable`, `nightly-msvc`)
    pub name: String,

    /// Host triple to resolve against instead of rustup's default host
    #[arg(long)]
    pub host: Option<String>,
}

impl ResourceKind {
    /// Whether a command scoped to `filter` covers this kind
    pub fn selected(self, filter: Option<Self>) -> bool {
        filter.is_none_or(|kind| kind == self)
    }
}
