//! notesync CLI
//!
//! Syncs Markdown files into macOS Notes from the command line or an editor
//! integration.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{ApiCommand, Cli, Commands};
use context::Context;
use error::Result;
use logging::LogOptions;

fn main() {
    if let Err(e) = run() {
        if e.needs_report() {
            eprintln!("{}: {}", "error".red().bold(), e);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // No command provided - show help hint
        println!("{} Markdown to Notes sync", "notesync".green().bold());
        println!();
        println!("Run {} for available commands.", "notesync --help".cyan());
        return Ok(());
    };

    let context = Context::load(cli.config, cli.dry_run);
    logging::init(
        &context.config.logging,
        LogOptions {
            verbose: cli.verbose,
            quiet: command.wants_quiet_logs(),
        },
    )?;
    for warning in &context.config_warnings {
        tracing::warn!(path = %context.store.path().display(), "{}", warning);
    }
    if !context.store.exists() {
        tracing::debug!(path = %context.store.path().display(), "No configuration file, using defaults");
    }
    if context.dry_run {
        tracing::info!("Dry run: Notes will not be modified");
    }

    execute_command(&context, command)
}

fn execute_command(context: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::SyncFile { file, options } => commands::run_sync_file(context, &file, &options),
        Commands::SyncFolder {
            folder,
            recursive,
            options,
        } => commands::run_sync_folder(context, &folder, recursive, &options),
        Commands::SyncFiles {
            files,
            file_list,
            options,
        } => commands::run_sync_files(context, &files, file_list.as_deref(), &options),
        Commands::Info => commands::run_info(context),
        Commands::Config {
            show,
            validate,
            init,
            force,
        } => commands::run_config(context, show, validate, init, force),
        Commands::Api { action } => execute_api(context, action),
    }
}

fn execute_api(context: &Context, action: ApiCommand) -> Result<()> {
    match action {
        ApiCommand::Sync { file, format, .. } => commands::run_api_sync(context, &file, format),
        ApiCommand::Status { format } => commands::run_api_status(context, format),
        ApiCommand::Config {
            editor,
            get,
            set,
            format,
        } => {
            let set = match set.as_deref() {
                Some([key, value]) => Some((key.as_str(), value.as_str())),
                Some(_) => return Err(error::CliError::user("--set takes a KEY and a VALUE")),
                None => None,
            };
            commands::run_api_config(context, editor, get.as_deref(), set, format)
        }
    }
}
