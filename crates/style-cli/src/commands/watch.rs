//! The watch command

use std::sync::Arc;

use colored::Colorize;

use style_core::{JsonStateStore, Preferences, Scheduler, UpdatePrefs};

use crate::context::AppContext;
use crate::error::{CliError, Result};

/// Run scheduled check-all passes until Ctrl-C.
pub async fn run_watch(ctx: &AppContext) -> Result<()> {
    if ctx.config.interval_hours <= 0.0 {
        return Err(CliError::user(
            "Scheduled checks are disabled (interval_hours = 0)",
        ));
    }

    let (scheduler, triggers) = Scheduler::new(ctx.config.min_delay());
    let scheduler = Arc::new(
        scheduler.with_state_store(Arc::new(JsonStateStore::new(&ctx.data_dir)))?,
    );
    let orchestrator = ctx.orchestrator()?.with_scheduler(Arc::clone(&scheduler));

    let prefs = Preferences::new(UpdatePrefs::from(&ctx.config));
    let follower = scheduler.follow(prefs.subscribe());
    scheduler.set_interval_hours(prefs.interval_hours());

    println!(
        "{} Checking every {} hours (last check {}). Press Ctrl-C to stop.",
        "=>".blue().bold(),
        prefs.interval_hours(),
        scheduler.last_check().format("%Y-%m-%d %H:%M:%S UTC")
    );

    tokio::select! {
        _ = orchestrator.run_scheduled(triggers) => {}
        signal = tokio::signal::ctrl_c() => signal?,
    }

    follower.abort();
    scheduler.cancel();
    orchestrator.activity_log().flush().await?;
    println!("{} Stopped.", "OK".green().bold());
    Ok(())
}
