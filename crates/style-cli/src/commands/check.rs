//! The check command

use colored::Colorize;

use style_core::{
    CheckAllOptions, CheckRequest, CheckResult, Outcome, StyleId, StyleStore, Trigger,
};

use crate::context::AppContext;
use crate::error::Result;

/// Check one style (`id`) or all styles with an update URL.
pub async fn run_check(ctx: &AppContext, id: Option<u64>, dry_run: bool, force: bool) -> Result<()> {
    let orchestrator = ctx.orchestrator()?;

    if let Some(id) = id {
        let id = StyleId(id);
        let name = ctx
            .styles
            .get_by_id(id)
            .await?
            .map(|style| style.name)
            .unwrap_or_default();
        let request = CheckRequest::by_id(id)
            .with_save(!dry_run)
            .with_ignore_digest(force);
        let result = CheckResult {
            id,
            name,
            outcome: orchestrator.check_one(&request, None).await,
        };
        orchestrator.activity_log().flush().await?;
        print_result(&result);
        return match result.outcome {
            Ok(_) => Ok(()),
            Err(err) => Err(err.into()),
        };
    }

    println!("{} Checking styles for updates...", "=>".blue().bold());
    let summary = orchestrator
        .check_all(CheckAllOptions {
            save: !dry_run,
            ignore_digest: force,
            trigger: Trigger::Manual,
            observer: None,
        })
        .await?;

    let mut results: Vec<&CheckResult> = summary.results.iter().collect();
    results.sort_by_key(|r| r.id);
    for result in results {
        print_result(result);
    }

    println!();
    let verb = if dry_run { "available" } else { "updated" };
    println!(
        "{} {} checked, {} {}, {} skipped, {} failed",
        "Done:".bold(),
        summary.checked(),
        summary.updated(),
        verb,
        summary.skipped(),
        summary.failed()
    );
    if dry_run && summary.updated() > 0 {
        println!("Run {} to apply.", "stylecheck check".cyan());
    }
    Ok(())
}

fn print_result(result: &CheckResult) {
    let label = format!("#{} {}", result.id, result.name);
    match &result.outcome {
        Ok(Outcome::Updated(_)) => {
            println!("   {} {}", "UPDATED".green().bold(), label);
        }
        Ok(Outcome::Preview(_)) => {
            println!("   {} {}", "AVAILABLE".cyan().bold(), label);
        }
        Ok(Outcome::Skipped(reason)) if reason.is_up_to_date() => {
            println!("   {} {} ({})", "OK".green(), label, reason.to_string().dimmed());
        }
        Ok(Outcome::Skipped(reason)) => {
            println!("   {} {} ({})", "SKIPPED".yellow().bold(), label, reason);
        }
        Err(err) => {
            println!("   {} {} ({})", "FAILED".red().bold(), label, err);
        }
    }
}
