//! Info command implementation

use colored::Colorize;
use notesync_core::SyncEngine;
use notesync_core::rules::{RuleKind, RuleSet};

use crate::context::Context;
use crate::error::Result;

/// Run the info command
///
/// Lists the Notes folders of the configured account and the default rules.
/// A Notes failure is shown inline; the rule listing is always printed.
pub fn run_info(context: &Context) -> Result<()> {
    let engine = context.engine(SyncEngine::default_rules())?;

    println!("{}", "Notes".bold());
    println!();
    match engine.notes_info() {
        Ok(info) => {
            println!("{}:   {}", "Account".dimmed(), info.account.cyan());
            println!("{}:   {}", "Folders".dimmed(), info.folders.len());
            println!("{}:     {}", "Notes".dimmed(), info.total_notes);
            for folder in &info.folders {
                println!("  {} {}: {}", "+".green(), folder.name, folder.note_count);
            }
        }
        Err(e) => {
            println!("  {} Failed to read Notes: {}", "!".red(), e);
        }
    }
    println!();

    print_rules(engine.rules());
    Ok(())
}

fn print_rules(rules: &RuleSet) {
    println!("{}", "Rules".bold());
    println!();
    for (index, rule) in rules.iter().enumerate() {
        let status = if rule.is_enabled() {
            "enabled".green()
        } else {
            "disabled".yellow()
        };
        println!(
            "  {:2}. {} ({}, priority {}, {})",
            index + 1,
            rule.name().cyan(),
            kind_label(rule.kind()),
            rule.priority(),
            status
        );
    }
}

fn kind_label(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::Effect => "effect",
        RuleKind::Filter => "filter",
        RuleKind::Derivation => "derivation",
    }
}
