//! Status command implementation

use colored::Colorize;
use serde::Serialize;

use repolink_core::IconKind;
use repolink_fs::tree::walk_relative;
use repolink_fs::{WellKnownPath, is_under};

use super::print_json;
use crate::context::Context;
use crate::error::Result;

#[derive(Serialize)]
struct StatusEntry {
    path: String,
    icon: IconKind,
    needs_attention: bool,
}

/// Classify every workspace entry against the current policy.
pub fn run_status(ctx: &Context, json: bool) -> Result<()> {
    let engine = ctx.engine()?;
    engine.refresh()?;

    let state_dir = WellKnownPath::StateDir.as_str();
    let mut entries = Vec::new();
    for path in walk_relative(ctx.workspace.path())? {
        if is_under(&path, state_dir) {
            continue;
        }
        if let Some(icon) = engine.describe(&path)? {
            entries.push(StatusEntry {
                needs_attention: icon.needs_attention(),
                path,
                icon,
            });
        }
    }

    if json {
        return print_json(&entries);
    }

    println!("{}", "Workspace Status".bold());
    println!();
    println!("{}: {}", "Project".dimmed(), ctx.project.path().display());
    println!("{}: {}", "Workspace".dimmed(), ctx.workspace.path().display());
    println!();

    if entries.is_empty() {
        println!("  {} (run {} to link)", "Empty".dimmed(), "repolink reconcile".cyan());
        return Ok(());
    }
    for entry in &entries {
        let label = if entry.needs_attention {
            entry.icon.label().yellow()
        } else {
            entry.icon.label().green()
        };
        println!("  {:<22} {}", label, entry.path);
    }

    let attention = entries.iter().filter(|e| e.needs_attention).count();
    if attention > 0 {
        println!();
        println!("{} entries need attention", attention.to_string().yellow());
    }
    Ok(())
}
