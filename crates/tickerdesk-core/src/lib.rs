//! # Tickerdesk Core
//!
//! Quote fetching, news classification and watchlist plumbing for a small
//! personal market dashboard.
//!
//! ## Overview
//!
//! - **Quote fetcher**: last and prior close per ticker, percentage change,
//!   direction with color and glyph
//! - **News classifier**: RSS/Atom entries deduplicated by title fingerprint,
//!   optionally translated, and sorted into the first matching keyword bucket
//! - **TTL cache** with single-flight `get_or_refresh`
//! - **Watchlist store** client for the external holdings/watch lists
//! - **Dashboard facade** gluing the above together behind one configuration
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL cache and cache modes |
//! | [`classifier`] | Topic table and news classifier |
//! | [`config`] | Dashboard configuration and environment overrides |
//! | [`dashboard`] | Cached dashboard facade |
//! | [`domain`] | Tickers, quotes, news items, batch reports |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Core error types |
//! | [`feeds`] | Feed fetching and RSS/Atom parsing |
//! | [`http_client`] | HTTP client abstraction |
//! | [`market_data`] | Market-data provider trait and Yahoo chart source |
//! | [`names`] | Display-name table |
//! | [`quotes`] | Quote fetcher |
//! | [`sectors`] | Sector gainers/losers leaderboard |
//! | [`translate`] | Headline translation |
//! | [`watchlist`] | External list store client |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickerdesk_core::{CacheMode, Dashboard, DashboardConfig, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DashboardConfig::resolve(None)?;
//!     let dashboard = Dashboard::from_config(&config, Arc::new(ReqwestHttpClient::default()))?;
//!
//!     let holdings = dashboard.quotes_for(tickerdesk_core::ListKind::Holdings, CacheMode::Use).await;
//!     for quote in &holdings.value.quotes {
//!         println!("{} {} {:.2}%", quote.glyph, quote.name, quote.change_pct);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Upstream failures never abort a refresh. They surface as [`Skipped`]
//! entries carrying a stable [`SourceError`] code:
//!
//! ```rust
//! use tickerdesk_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::NoData => "nothing to show",
//!         SourceErrorKind::RateLimited => "try again later",
//!         _ => "upstream problem",
//!     }
//! }
//! ```

pub mod cache;
pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod feeds;
pub mod http_client;
pub mod market_data;
pub mod names;
pub mod quotes;
pub mod sectors;
pub mod translate;
pub mod watchlist;

// Caching
pub use cache::{CacheLookup, CacheMode, TtlCache};

// News classification
pub use classifier::{fingerprint, NewsClassifier, NewsReport, NewsSettings, TopicBucket, TopicTable};

// Configuration
pub use config::DashboardConfig;

// Dashboard facade
pub use dashboard::{Dashboard, DashboardSnapshot};

// Domain models
pub use domain::{
    char_prefix, parse_ticker_list, BatchStatus, Direction, FeedEntry, FeedSource, NewsBucket,
    NewsItem, QuoteResult, Skipped, Ticker, Trend,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};

// Error types
pub use error::{CoreError, SourceError, SourceErrorKind, ValidationError};

// Feeds
pub use feeds::{parse_feed, FeedFetcher, HttpFeedFetcher};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StaticHttpClient,
};

// Market data
pub use market_data::{MarketDataSource, PriceHistory, YahooChartSource};

pub use names::NameTable;
pub use quotes::{QuoteFetcher, QuoteReport, QuoteSettings};
pub use sectors::{leaderboard, RankedQuote, Sector, SectorLeaderboard, SectorTable};

// Translation
pub use translate::{CachedTranslator, GoogleTranslator, NoopTranslator, Translator};

// Watchlist
pub use watchlist::{AppsScriptStore, ListKind, MemoryStore, Watchlist, WatchlistStore};
