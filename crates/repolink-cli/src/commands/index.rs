//! Index command implementation

use colored::Colorize;
use serde::Serialize;

use repolink_core::RepositoryPath;

use super::print_json;
use crate::context::Context;
use crate::error::Result;

#[derive(Serialize)]
struct IndexEntry<'a> {
    path: &'a RepositoryPath,
    selected: bool,
}

/// List every repository under the project root and whether the policy selects it.
pub fn run_index(ctx: &Context, json: bool) -> Result<()> {
    let engine = ctx.engine()?;
    let refresh = engine.refresh()?;

    let entries: Vec<IndexEntry<'_>> = refresh
        .indexed
        .iter()
        .map(|path| IndexEntry {
            path,
            selected: refresh.filtered.contains(path),
        })
        .collect();

    if json {
        return print_json(&entries);
    }

    println!(
        "{} {}",
        "Repositories under".bold(),
        ctx.project.path().display()
    );
    println!();
    if entries.is_empty() {
        println!("  {}", "None found".dimmed());
        return Ok(());
    }
    for entry in &entries {
        if entry.selected {
            println!("  {} {}", "+".green(), entry.path.as_str().cyan());
        } else {
            println!("  {} {}", "-".dimmed(), entry.path.as_str().dimmed());
        }
    }
    println!();
    println!(
        "{} indexed, {} selected",
        refresh.indexed.len(),
        refresh.filtered.len()
    );
    Ok(())
}
