//! `toolsync matcher` - show how a toolchain name is found in rustup output

use anyhow::{Context as AnyhowContext, Result};
use toolchain::{Client, TargetTriple, ToolchainMatcher};

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, name: &str, host: Option<&str>) -> Result<()> {
    let host = match host {
        Some(host) => host
            .parse()
            .with_context(|| format!("Invalid host triple '{host}'"))?,
        None => Client::new()?.host()?,
    };
    let matcher = build(name, &host)?;

    if ctx.quiet {
        println!("{matcher}");
        return Ok(());
    }

    ui::kv("toolchain", &matcher.toolchain().to_string());
    ui::kv("host", &host.to_string());
    ui::kv("pattern", matcher.as_str());
    Ok(())
}

fn build(name: &str, host: &TargetTriple) -> Result<ToolchainMatcher> {
    ToolchainMatcher::new(name, host).with_context(|| format!("Invalid toolchain name '{name}'"))
}
