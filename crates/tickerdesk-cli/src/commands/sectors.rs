use tickerdesk_core::{CacheMode, Dashboard};

use crate::error::CliError;

use super::CommandResult;

pub async fn run(dashboard: &Dashboard, mode: CacheMode) -> Result<CommandResult, CliError> {
    let lookup = dashboard.sectors(mode).await;
    let board = lookup.value;

    Ok(CommandResult::ok(serde_json::to_value(&board)?)
        .with_skipped(board.skipped.iter().chain(board.batch_error.iter()))
        .with_cache_hit(lookup.cache_hit)
        .with_status(board.status()))
}
