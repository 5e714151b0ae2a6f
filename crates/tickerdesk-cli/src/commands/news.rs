use serde::Serialize;
use tickerdesk_core::{BatchStatus, CacheMode, Dashboard, NewsBucket};

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct NewsData<'a> {
    status: BatchStatus,
    duplicates_dropped: usize,
    buckets: &'a [NewsBucket],
}

pub async fn run(dashboard: &Dashboard, mode: CacheMode) -> Result<CommandResult, CliError> {
    let lookup = dashboard.news(mode).await;
    let report = lookup.value;
    let status = report.status(dashboard.feeds().len());

    let data = serde_json::to_value(NewsData {
        status,
        duplicates_dropped: report.duplicates_dropped,
        buckets: &report.buckets,
    })?;

    Ok(CommandResult::ok(data)
        .with_skipped(report.skipped.iter())
        .with_warnings(report.warnings.clone())
        .with_cache_hit(lookup.cache_hit)
        .with_status(status))
}
