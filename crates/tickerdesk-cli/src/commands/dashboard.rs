use tickerdesk_core::{CacheMode, Dashboard};

use crate::error::CliError;

use super::CommandResult;

pub async fn run(dashboard: &Dashboard, mode: CacheMode) -> Result<CommandResult, CliError> {
    let lookup = dashboard.snapshot(mode).await;
    let snapshot = lookup.value;

    let skipped = snapshot
        .holdings
        .skipped
        .iter()
        .chain(snapshot.holdings.batch_error.iter())
        .chain(snapshot.watch.skipped.iter())
        .chain(snapshot.watch.batch_error.iter())
        .chain(snapshot.sectors.skipped.iter())
        .chain(snapshot.sectors.batch_error.iter())
        .chain(snapshot.news.skipped.iter());

    Ok(CommandResult::ok(serde_json::to_value(&snapshot)?)
        .with_skipped(skipped)
        .with_warnings(snapshot.news.warnings.clone())
        .with_cache_hit(lookup.cache_hit)
        .with_status(snapshot.status(dashboard.feeds().len())))
}
