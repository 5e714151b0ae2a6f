//! Market-data provider contract and the Yahoo chart implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest};
use crate::{SourceError, Ticker};

/// Trailing daily closes for one ticker, oldest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceHistory {
    pub closes: Vec<f64>,
    /// Provider-supplied short name, used when the static name table has no entry.
    pub short_name: Option<String>,
}

impl PriceHistory {
    pub fn new(closes: Vec<f64>, short_name: Option<String>) -> Self {
        Self { closes, short_name }
    }
}

/// Per-ticker result of a batched history lookup.
pub type HistoryResult = (Ticker, Result<PriceHistory, SourceError>);

/// Market-data provider contract.
///
/// `history_batch` returns one entry per requested ticker, in request order.
/// An outer `Err` means the batch as a whole could not be attempted.
pub trait MarketDataSource: Send + Sync {
    fn id(&self) -> &'static str;

    fn history<'a>(
        &'a self,
        ticker: &'a Ticker,
        lookback: usize,
    ) -> Pin<Box<dyn Future<Output = Result<PriceHistory, SourceError>> + Send + 'a>>;

    fn history_batch<'a>(
        &'a self,
        tickers: &'a [Ticker],
        lookback: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<HistoryResult>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let mut results = Vec::with_capacity(tickers.len());
            for ticker in tickers {
                let result = self.history(ticker, lookback).await;
                results.push((ticker.clone(), result));
            }
            Ok(results)
        })
    }
}

pub const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance v8 chart endpoint, daily interval.
#[derive(Clone)]
pub struct YahooChartSource {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl YahooChartSource {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: YAHOO_CHART_BASE_URL.to_owned(),
            timeout_ms: 10_000,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn chart_request(&self, ticker: &Ticker, lookback: usize) -> HttpRequest {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(ticker.as_str())
        );

        HttpRequest::get(url)
            .with_query("range", range_for_lookback(lookback))
            .with_query("interval", "1d")
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout_ms(self.timeout_ms)
    }

    async fn fetch_history(
        &self,
        ticker: &Ticker,
        lookback: usize,
    ) -> Result<PriceHistory, SourceError> {
        let request = self.chart_request(ticker, lookback);
        let response = self.http_client.execute(request).await.map_err(|e| {
            if e.timed_out() {
                SourceError::unavailable(format!(
                    "yahoo request for {ticker} timed out after {} ms",
                    self.timeout_ms
                ))
            } else {
                SourceError::unavailable(format!("yahoo transport error: {}", e.message()))
            }
        })?;

        match response.status {
            404 => {
                return Err(SourceError::no_data(format!(
                    "yahoo has no chart for {ticker}"
                )))
            }
            429 => {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited the chart request",
                ))
            }
            status if !(200..300).contains(&status) => {
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {status}"
                )))
            }
            _ => {}
        }

        let history = parse_chart_response(&response.body, lookback)?;
        debug!(ticker = %ticker, closes = history.closes.len(), "fetched yahoo chart");
        Ok(history)
    }
}

impl MarketDataSource for YahooChartSource {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    fn history<'a>(
        &'a self,
        ticker: &'a Ticker,
        lookback: usize,
    ) -> Pin<Box<dyn Future<Output = Result<PriceHistory, SourceError>> + Send + 'a>> {
        Box::pin(self.fetch_history(ticker, lookback))
    }
}

fn range_for_lookback(lookback: usize) -> &'static str {
    // Trading days are sparser than calendar days; ask for a window that covers weekends.
    match lookback {
        0..=3 => "5d",
        4..=15 => "1mo",
        16..=60 => "3mo",
        _ => "1y",
    }
}

/// Extract the last `lookback` finite closes and the short name from a chart payload.
pub fn parse_chart_response(body: &str, lookback: usize) -> Result<PriceHistory, SourceError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo chart: {}", e)))?;

    if let Some(error) = chart_response.chart.error {
        return Err(if error.code.eq_ignore_ascii_case("not found") {
            SourceError::no_data(error.description)
        } else {
            SourceError::unavailable(format!("yahoo chart API error: {}", error.description))
        });
    }

    let Some(result) = chart_response.chart.result.into_iter().flatten().next() else {
        return Ok(PriceHistory::default());
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| {
            quote
                .close
                .into_iter()
                .flatten()
                .filter(|close| close.is_finite())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let skip = closes.len().saturating_sub(lookback.max(2));
    let short_name = result
        .meta
        .and_then(|meta| meta.short_name.or(meta.long_name))
        .filter(|name| !name.trim().is_empty());

    Ok(PriceHistory::new(
        closes.into_iter().skip(skip).collect(),
        short_name,
    ))
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartMeta {
    #[serde(rename = "shortName", default)]
    short_name: Option<String>,
    #[serde(rename = "longName", default)]
    long_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
