//! Policy command implementation

use colored::Colorize;

use repolink_core::{ListSetting, PolicyUpdate, ReconciliationPolicy, ToggleSetting};

use super::print_json;
use super::reconcile::print_report;
use crate::cli::PolicyAction;
use crate::context::Context;
use crate::error::Result;

/// Show or change the policy, reconciling afterwards when asked.
pub async fn run_policy(ctx: &Context, action: PolicyAction) -> Result<()> {
    let engine = ctx.engine()?;
    let reconcile = action.reconcile_after();

    let update = match action {
        PolicyAction::Show { json } => {
            let policy = engine.policy();
            return if json {
                print_json(&policy)
            } else {
                print_policy(ctx, &policy);
                Ok(())
            };
        }
        PolicyAction::Add { setting, item, .. } => PolicyUpdate::AddListItem(setting.into(), item),
        PolicyAction::Remove { setting, item, .. } => {
            PolicyUpdate::RemoveListItem(setting.into(), item)
        }
        PolicyAction::Replace { setting, items, .. } => PolicyUpdate::SetList(setting.into(), items),
        PolicyAction::Set { setting, value, .. } => PolicyUpdate::SetToggle(setting.into(), value),
    };

    if engine.update_policy([update])? {
        println!("{} {}", "Saved".green(), ctx.policy_store().path());
    } else {
        println!("{}", "Policy unchanged".dimmed());
    }

    if reconcile {
        let report = engine.reconcile().await?;
        println!();
        print_report(&report, false)?;
    }
    Ok(())
}

fn print_policy(ctx: &Context, policy: &ReconciliationPolicy) {
    println!("{}", "Policy".bold());
    println!();
    println!("{}: {}", "File".dimmed(), ctx.policy_store().path());
    println!();
    for setting in ToggleSetting::ALL {
        let value = if policy.toggle(setting) {
            "true".green()
        } else {
            "false".yellow()
        };
        println!("{}: {}", setting.key().cyan(), value);
    }
    for setting in ListSetting::ALL {
        println!("{}:", setting.key().cyan());
        let items = policy.list(setting);
        if items.is_empty() {
            println!("  {}", "None".dimmed());
        }
        for item in items {
            println!("  {} {}", "-".dimmed(), item);
        }
    }
}
