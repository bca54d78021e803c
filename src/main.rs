mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use engine::ExecuteOptions;
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, cli) {
        Ok(code) => code,
        Err(e) => {
            report(&ctx, &e);
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, cli: Cli) -> Result<ExitCode> {
    let config = cli.config.as_deref();

    match cli.command {
        Command::Status(args) => {
            let in_sync = commands::declarative::status(ctx, config, args.kind)?;
            Ok(if in_sync {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Command::Diff(args) => {
            commands::declarative::diff(config, args.kind, args.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Apply(args) => {
            let opts = ExecuteOptions {
                dry_run: args.dry_run,
                yes: args.yes,
                fail_fast: args.fail_fast,
                quiet: ctx.quiet,
            };
            commands::declarative::apply(ctx, config, args.kind, &opts)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Matcher(args) => {
            commands::matcher::run(ctx, &args.name, args.host.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "toolsync", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print an error with its cause chain and, for library errors, what to do about it
fn report(ctx: &Context, e: &anyhow::Error) {
    ui::error(&format!("{e:#}"));

    let advice = e.chain().find_map(|cause| {
        if let Some(err) = cause.downcast_ref::<toolchain::Error>() {
            Some(err.category().advice())
        } else {
            cause
                .downcast_ref::<declarative::Error>()
                .map(|err| err.category().advice())
        }
    });
    if let Some(advice) = advice {
        ui::dim(advice);
    }
    if ctx.verbose > 1 {
        eprintln!("{e:?}");
    }
}
