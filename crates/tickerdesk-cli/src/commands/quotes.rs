use serde::Serialize;
use tickerdesk_core::{
    parse_ticker_list, BatchStatus, CacheMode, Dashboard, ListKind, QuoteResult, ValidationError,
};

use crate::cli::QuotesArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct QuotesData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    list: Option<ListKind>,
    status: BatchStatus,
    quotes: &'a [QuoteResult],
}

pub async fn run(
    args: &QuotesArgs,
    dashboard: &Dashboard,
    mode: CacheMode,
) -> Result<CommandResult, CliError> {
    let (list, lookup) = if args.tickers.is_empty() {
        let kind = args.list.map(ListKind::from).unwrap_or(ListKind::Holdings);
        (Some(kind), dashboard.quotes_for(kind, mode).await)
    } else {
        let tickers = args
            .tickers
            .iter()
            .flat_map(|raw| parse_ticker_list(raw))
            .collect::<Vec<_>>();
        if tickers.is_empty() {
            return Err(ValidationError::EmptyTicker.into());
        }
        (None, dashboard.quotes(&tickers, mode).await)
    };

    let report = lookup.value;
    let status = report.status();
    let data = serde_json::to_value(QuotesData {
        list,
        status,
        quotes: &report.quotes,
    })?;

    Ok(CommandResult::ok(data)
        .with_skipped(report.skipped.iter().chain(report.batch_error.iter()))
        .with_cache_hit(lookup.cache_hit)
        .with_status(status))
}
