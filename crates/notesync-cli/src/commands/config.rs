//! Config command implementation

use colored::Colorize;

use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the config command with exactly one of its actions
pub fn run_config(context: &Context, show: bool, validate: bool, init: bool, force: bool) -> Result<()> {
    if show {
        run_show(context)
    } else if validate {
        run_validate(context)
    } else if init {
        run_init(context, force)
    } else {
        Err(CliError::user(
            "Specify a config action: --show, --validate or --init",
        ))
    }
}

fn run_show(context: &Context) -> Result<()> {
    let path = context.store.path();
    let document = context.store.load_value().map_err(|e| {
        CliError::user(format!("Cannot show configuration {}: {}", path.display(), e))
    })?;

    println!("{}: {}", "Config".dimmed(), path.display());
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn run_validate(context: &Context) -> Result<()> {
    let issues = context.store.validate();
    if issues.is_empty() {
        println!("{} Configuration is valid.", "OK".green().bold());
        return Ok(());
    }

    println!("{} Configuration has problems:", "INVALID".red().bold());
    for issue in &issues {
        println!("   {} {}", "!".red(), issue);
    }
    Err(CliError::Reported)
}

fn run_init(context: &Context, force: bool) -> Result<()> {
    context.store.init(force)?;
    println!(
        "{} Created configuration {}",
        "OK".green().bold(),
        context.store.path().display().to_string().cyan()
    );
    Ok(())
}
