//! Reconcile and start commands

use colored::Colorize;

use repolink_core::{GateOutcome, ReconcileReport};

use super::print_json;
use crate::context::Context;
use crate::error::Result;

/// Run one full pass.
pub async fn run_reconcile(ctx: &Context, json: bool) -> Result<()> {
    let engine = ctx.engine()?;
    let report = engine.reconcile().await?;
    print_report(&report, json)
}

/// Reconcile only if the stored policy asks for it on start.
pub async fn run_start(ctx: &Context, json: bool) -> Result<()> {
    let engine = ctx.engine()?;
    match engine.start().await? {
        Some(report) => print_report(&report, json),
        None if json => print_json(&serde_json::Value::Null),
        None => {
            println!(
                "{} shouldSymlinkOnStart is off, nothing to do",
                "Skipped:".dimmed()
            );
            Ok(())
        }
    }
}

pub(crate) fn print_report(report: &ReconcileReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }

    println!("{}", "Reconciled".green().bold());
    println!();
    println!("{}:   {}", "Indexed".dimmed(), report.indexed.len());
    println!("{}:   {}", "Removed".dimmed(), report.deleted);
    println!(
        "{}:    {} directories, {} files",
        "Linked".dimmed(),
        report.dir_links,
        report.file_links
    );
    let gate = match report.gate {
        GateOutcome::Confirmed => "confirmed".green(),
        GateOutcome::TimedOut => "timed out".yellow(),
    };
    println!("{}: {}", "Teardown".dimmed(), gate);
    println!();
    for repo in &report.linked {
        println!("  {} {}", "+".green(), repo.as_str().cyan());
    }
    Ok(())
}
