//! Sector leaderboard: top gainers and losers across a fixed ticker table.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::quotes::{QuoteFetcher, QuoteReport};
use crate::{BatchStatus, QuoteResult, Skipped, Ticker};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub label: String,
    pub tickers: Vec<Ticker>,
}

impl Sector {
    pub fn new(label: impl Into<String>, tickers: Vec<Ticker>) -> Self {
        Self {
            label: label.into(),
            tickers,
        }
    }
}

/// Ordered sector table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorTable {
    sectors: Vec<Sector>,
}

impl SectorTable {
    pub fn new(sectors: Vec<Sector>) -> Self {
        Self { sectors }
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// Every ticker in table order, first occurrence kept.
    pub fn tickers(&self) -> Vec<Ticker> {
        let mut tickers: Vec<Ticker> = Vec::new();
        for ticker in self.sectors.iter().flat_map(|sector| sector.tickers.iter()) {
            if !tickers.contains(ticker) {
                tickers.push(ticker.clone());
            }
        }
        tickers
    }

    pub fn sector_of(&self, ticker: &Ticker) -> Option<&str> {
        self.sectors
            .iter()
            .find(|sector| sector.tickers.contains(ticker))
            .map(|sector| sector.label.as_str())
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedQuote {
    pub sector: String,
    #[serde(flatten)]
    pub quote: QuoteResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorLeaderboard {
    /// Percentage change descending.
    pub gainers: Vec<RankedQuote>,
    /// Percentage change ascending.
    pub losers: Vec<RankedQuote>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_error: Option<Skipped>,
}

impl SectorLeaderboard {
    pub fn status(&self) -> BatchStatus {
        if self.batch_error.is_some() {
            return BatchStatus::Failed;
        }
        BatchStatus::from_counts(self.gainers.len(), self.skipped.len())
    }

    /// Rank a finished quote report.
    pub fn from_report(table: &SectorTable, report: QuoteReport, top_n: usize) -> Self {
        let mut ranked = report
            .quotes
            .into_iter()
            .map(|quote| RankedQuote {
                sector: table.sector_of(&quote.ticker).unwrap_or_default().to_owned(),
                quote,
            })
            .collect::<Vec<_>>();

        // Stable sort keeps table order among equal moves.
        ranked.sort_by(|a, b| b.quote.change_pct.total_cmp(&a.quote.change_pct));
        let gainers = ranked.iter().take(top_n).cloned().collect();
        let losers = ranked.iter().rev().take(top_n).cloned().collect::<Vec<_>>();

        Self {
            gainers,
            losers,
            skipped: report.skipped,
            batch_error: report.batch_error,
        }
    }
}

/// Quote every sector ticker and rank the results.
pub async fn leaderboard(fetcher: &QuoteFetcher, table: &SectorTable, top_n: usize) -> SectorLeaderboard {
    let report = fetcher.fetch_report(&table.tickers()).await;
    let board = SectorLeaderboard::from_report(table, report, top_n);
    info!(
        gainers = board.gainers.len(),
        losers = board.losers.len(),
        skipped = board.skipped.len(),
        "sector leaderboard built"
    );
    board
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(raw: &str) -> Ticker {
        Ticker::parse(raw).expect("valid ticker")
    }

    fn quote(raw: &str, prev: f64, price: f64) -> QuoteResult {
        QuoteResult::from_closes(ticker(raw), raw.to_owned(), price, prev, 3.0)
    }

    #[test]
    fn ranks_gainers_and_losers() {
        let table = SectorTable::new(vec![
            Sector::new("Shipping", vec![ticker("A.X"), ticker("B.X")]),
            Sector::new("Chips", vec![ticker("C.X"), ticker("A.X")]),
        ]);
        assert_eq!(table.tickers().len(), 3);

        let report = QuoteReport {
            quotes: vec![quote("A.X", 100.0, 105.0), quote("B.X", 100.0, 90.0), quote("C.X", 100.0, 101.0)],
            ..QuoteReport::empty()
        };

        let board = SectorLeaderboard::from_report(&table, report, 2);

        let gainers = board.gainers.iter().map(|r| r.quote.ticker.as_str()).collect::<Vec<_>>();
        let losers = board.losers.iter().map(|r| r.quote.ticker.as_str()).collect::<Vec<_>>();
        assert_eq!(gainers, vec!["A.X", "C.X"]);
        assert_eq!(losers, vec!["B.X", "C.X"]);
        assert_eq!(board.gainers[0].sector, "Shipping");
    }
}
