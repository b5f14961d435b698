//! The log command

use style_core::LogStore;

use crate::context::AppContext;
use crate::error::Result;

/// Print the persisted activity log, optionally only its last `tail` lines.
pub async fn run_log(ctx: &AppContext, tail: Option<usize>) -> Result<()> {
    let lines = ctx
        .logs
        .read_log()
        .await?
        .map(|doc| doc.lines)
        .unwrap_or_default();

    if lines.is_empty() {
        println!("No update activity recorded yet.");
        return Ok(());
    }

    let start = tail.map_or(0, |n| lines.len().saturating_sub(n));
    for line in &lines[start..] {
        println!("{line}");
    }
    Ok(())
}
