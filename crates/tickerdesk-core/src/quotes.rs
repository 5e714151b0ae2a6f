//! Quote fetcher: closes → change, percentage, direction and display name.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::market_data::{MarketDataSource, PriceHistory};
use crate::names::NameTable;
use crate::{BatchStatus, QuoteResult, Skipped, SourceError, Ticker};

/// Tunables for quote fetching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteSettings {
    /// Daily observations requested per ticker (at least two are used).
    pub lookback: usize,
    /// Absolute percentage move that counts as a surge or plunge.
    pub trend_threshold_pct: f64,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            lookback: 5,
            trend_threshold_pct: 3.0,
        }
    }
}

/// Outcome of one quote batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteReport {
    pub quotes: Vec<QuoteResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
    /// Set when the provider could not attempt the batch at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_error: Option<Skipped>,
}

impl QuoteReport {
    pub fn empty() -> Self {
        Self {
            quotes: Vec::new(),
            skipped: Vec::new(),
            batch_error: None,
        }
    }

    pub fn status(&self) -> BatchStatus {
        if self.batch_error.is_some() {
            return BatchStatus::Failed;
        }
        BatchStatus::from_counts(self.quotes.len(), self.skipped.len())
    }
}

/// Resolves quotes for a ticker batch without ever aborting the batch.
#[derive(Clone)]
pub struct QuoteFetcher {
    source: Arc<dyn MarketDataSource>,
    names: Arc<NameTable>,
    settings: QuoteSettings,
}

impl QuoteFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>, names: Arc<NameTable>) -> Self {
        Self {
            source,
            names,
            settings: QuoteSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: QuoteSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> QuoteSettings {
        self.settings
    }

    /// Quotes for raw ticker strings. Blank entries are discarded, duplicates collapse
    /// to their first occurrence, and unavailable tickers are silently left out.
    pub async fn fetch_quotes<S: AsRef<str>>(&self, tickers: &[S]) -> Vec<QuoteResult> {
        let parsed = tickers
            .iter()
            .filter_map(|raw| Ticker::parse(raw.as_ref()).ok())
            .collect::<Vec<_>>();
        self.fetch_report(&parsed).await.quotes
    }

    /// Quotes plus a record of every skipped ticker.
    pub async fn fetch_report(&self, tickers: &[Ticker]) -> QuoteReport {
        let tickers = dedupe_preserving_order(tickers);
        if tickers.is_empty() {
            return QuoteReport::empty();
        }

        let lookback = self.settings.lookback.max(2);
        let histories = match self.source.history_batch(&tickers, lookback).await {
            Ok(histories) => histories,
            Err(error) => {
                warn!(
                    provider = self.source.id(),
                    tickers = tickers.len(),
                    error = %error,
                    "quote batch could not be attempted"
                );
                return QuoteReport {
                    batch_error: Some(Skipped::new(self.source.id(), &error)),
                    ..QuoteReport::empty()
                };
            }
        };

        let mut report = QuoteReport::empty();
        for (ticker, history) in histories {
            match history.and_then(|history| self.build_quote(&ticker, history)) {
                Ok(quote) => {
                    debug!(ticker = %ticker, price = quote.price, pct = quote.change_pct, "resolved quote");
                    report.quotes.push(quote);
                }
                Err(error) => {
                    warn!(ticker = %ticker, error = %error, "skipping ticker");
                    report.skipped.push(Skipped::new(ticker.as_str(), &error));
                }
            }
        }

        report
    }

    fn build_quote(&self, ticker: &Ticker, history: PriceHistory) -> Result<QuoteResult, SourceError> {
        let mut closes = history.closes.iter().rev();
        let Some(&price) = closes.next() else {
            return Err(SourceError::no_data(format!("no closing prices for {ticker}")));
        };
        let previous_close = closes.next().copied().unwrap_or(price);
        let name = self
            .names
            .resolve(ticker, history.short_name.as_deref());

        Ok(QuoteResult::from_closes(
            ticker.clone(),
            name,
            price,
            previous_close,
            self.settings.trend_threshold_pct,
        ))
    }
}

fn dedupe_preserving_order(tickers: &[Ticker]) -> Vec<Ticker> {
    let mut seen = HashSet::with_capacity(tickers.len());
    tickers
        .iter()
        .filter(|ticker| seen.insert(ticker.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::future::Future;
    use std::pin::Pin;

    struct FixedSource(BTreeMap<&'static str, Vec<f64>>);

    impl MarketDataSource for FixedSource {
        fn id(&self) -> &'static str {
            "fixed"
        }

        fn history<'a>(
            &'a self,
            ticker: &'a Ticker,
            _lookback: usize,
        ) -> Pin<Box<dyn Future<Output = Result<PriceHistory, SourceError>> + Send + 'a>> {
            let closes = self.0.get(ticker.as_str()).cloned().unwrap_or_default();
            Box::pin(async move { Ok(PriceHistory::new(closes, None)) })
        }
    }

    fn fetcher(entries: &[(&'static str, Vec<f64>)]) -> QuoteFetcher {
        let source = FixedSource(entries.iter().cloned().collect());
        QuoteFetcher::new(Arc::new(source), Arc::new(NameTable::default()))
    }

    #[tokio::test]
    async fn duplicate_and_blank_tickers_collapse() {
        let fetcher = fetcher(&[("AAA.X", vec![1.0, 2.0])]);
        let quotes = fetcher.fetch_quotes(&["aaa.x", " ", "AAA.X"]).await;
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].name, "AAA");
    }

    #[tokio::test]
    async fn empty_history_is_recorded_as_no_data() {
        let fetcher = fetcher(&[]);
        let ticker = Ticker::parse("BBB.X").expect("valid ticker");
        let report = fetcher.fetch_report(&[ticker]).await;
        assert!(report.quotes.is_empty());
        assert_eq!(report.skipped[0].code, "source.no_data");
        assert_eq!(report.status(), BatchStatus::Failed);
    }

    #[tokio::test]
    async fn empty_input_is_a_complete_empty_batch() {
        let fetcher = fetcher(&[]);
        let report = fetcher.fetch_report(&[]).await;
        assert!(report.quotes.is_empty());
        assert_eq!(report.status(), BatchStatus::Complete);
    }
}
