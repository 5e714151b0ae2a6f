//! Dashboard facade: cached quotes, news and sector views over one configuration.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheLookup, CacheMode, TtlCache};
use crate::classifier::{NewsClassifier, NewsReport, TopicTable};
use crate::config::{seed_tickers, CacheConfig, DashboardConfig};
use crate::feeds::HttpFeedFetcher;
use crate::http_client::HttpClient;
use crate::market_data::YahooChartSource;
use crate::names::NameTable;
use crate::quotes::{QuoteFetcher, QuoteReport};
use crate::sectors::{leaderboard, SectorLeaderboard, SectorTable};
use crate::translate::{CachedTranslator, GoogleTranslator, NoopTranslator, Translator};
use crate::watchlist::{AppsScriptStore, ListKind, MemoryStore, Watchlist, WatchlistStore};
use crate::{BatchStatus, FeedSource, Ticker, ValidationError};

const QUOTES_PREFIX: &str = "quotes:";

/// Everything a full dashboard render needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub holdings: QuoteReport,
    pub watch: QuoteReport,
    pub sectors: SectorLeaderboard,
    pub news: NewsReport,
}

impl DashboardSnapshot {
    /// `Failed` when every part failed, `Partial` when any part lost data.
    pub fn status(&self, feed_count: usize) -> BatchStatus {
        let parts = [
            self.holdings.status(),
            self.watch.status(),
            self.sectors.status(),
            self.news.status(feed_count),
        ];

        if parts.iter().all(|status| *status == BatchStatus::Failed) {
            BatchStatus::Failed
        } else if parts.iter().all(|status| *status == BatchStatus::Complete) {
            BatchStatus::Complete
        } else {
            BatchStatus::Partial
        }
    }
}

/// Cache-gated access to quotes, news, sectors and the external lists.
#[derive(Clone)]
pub struct Dashboard {
    fetcher: QuoteFetcher,
    classifier: NewsClassifier,
    watchlist: Watchlist,
    feeds: Vec<FeedSource>,
    topics: TopicTable,
    sectors: SectorTable,
    sectors_top_n: usize,
    quote_cache: TtlCache<QuoteReport>,
    news_cache: TtlCache<NewsReport>,
    sector_cache: TtlCache<SectorLeaderboard>,
}

impl Dashboard {
    pub fn new(
        fetcher: QuoteFetcher,
        classifier: NewsClassifier,
        watchlist: Watchlist,
        topics: TopicTable,
    ) -> Self {
        let cache = CacheConfig::default();
        Self {
            fetcher,
            classifier,
            watchlist,
            feeds: Vec::new(),
            topics,
            sectors: SectorTable::default(),
            sectors_top_n: 5,
            quote_cache: TtlCache::new(cache.quotes_ttl()),
            news_cache: TtlCache::new(cache.news_ttl()),
            sector_cache: TtlCache::new(cache.sectors_ttl()),
        }
    }

    pub fn with_feeds(mut self, feeds: Vec<FeedSource>) -> Self {
        self.feeds = feeds;
        self
    }

    pub fn with_sectors(mut self, sectors: SectorTable, top_n: usize) -> Self {
        self.sectors = sectors;
        self.sectors_top_n = top_n;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.quote_cache = ttl_cache(cache.quotes_ttl());
        self.news_cache = ttl_cache(cache.news_ttl());
        self.sector_cache = ttl_cache(cache.sectors_ttl());
        self
    }

    /// Wire production collaborators from `config` over `http_client`.
    ///
    /// The Apps Script store is used when `watchlist.endpoint` is set; otherwise
    /// an in-process store seeded with the configured lists.
    pub fn from_config(
        config: &DashboardConfig,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;

        let source = YahooChartSource::new(Arc::clone(&http_client))
            .with_base_url(config.quotes.base_url.as_str())
            .with_timeout_ms(config.http.timeout_ms);
        let names = NameTable::new(config.names.clone(), config.quotes.name_max_chars);
        let fetcher = QuoteFetcher::new(Arc::new(source), Arc::new(names))
            .with_settings(config.quotes.settings());

        let translation = &config.news.translation;
        let mut feeds = config.news.feeds.clone();
        let translator: Arc<dyn Translator> = if translation.enabled {
            let google = GoogleTranslator::new(Arc::clone(&http_client), translation.target.as_str())
                .with_base_url(translation.base_url.as_str())
                .with_timeout_ms(config.http.timeout_ms);
            Arc::new(CachedTranslator::new(
                Arc::new(google),
                Duration::from_secs(translation.cache_ttl_secs),
            ))
        } else {
            feeds.iter_mut().for_each(|feed| feed.translate = false);
            Arc::new(NoopTranslator)
        };
        let feed_fetcher =
            HttpFeedFetcher::new(Arc::clone(&http_client)).with_timeout_ms(config.http.timeout_ms);
        let classifier = NewsClassifier::new(Arc::new(feed_fetcher), translator)
            .with_settings(config.news.settings());

        let store: Arc<dyn WatchlistStore> = match config.watchlist.endpoint.as_deref() {
            Some(endpoint) => {
                let mut store = AppsScriptStore::new(Arc::clone(&http_client), endpoint)
                    .with_timeout_ms(config.watchlist.timeout_ms);
                if let Some(user) = config.watchlist.user.as_deref() {
                    store = store.with_user(user);
                }
                Arc::new(store)
            }
            None => Arc::new(MemoryStore::seeded(ListKind::ALL.map(|kind| {
                let seed: Vec<String> = seed_tickers(&config.watchlist, kind)
                    .into_iter()
                    .map(String::from)
                    .collect();
                (kind, seed)
            }))),
        };

        Ok(
            Self::new(fetcher, classifier, Watchlist::new(store), config.news.topic_table()?)
                .with_feeds(feeds)
                .with_sectors(config.sectors.table.clone(), config.sectors.top_n)
                .with_cache(config.cache),
        )
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    pub fn feeds(&self) -> &[FeedSource] {
        &self.feeds
    }

    pub fn topics(&self) -> &TopicTable {
        &self.topics
    }

    /// Quotes for an explicit ticker set, cached per set.
    pub async fn quotes(&self, tickers: &[Ticker], mode: CacheMode) -> CacheLookup<QuoteReport> {
        let key = quotes_key(tickers);
        let lookup = self
            .quote_cache
            .get_or_refresh(&key, None, mode, || self.fetcher.fetch_report(tickers))
            .await;
        debug!(key = %key, cache_hit = lookup.cache_hit, "quotes");
        lookup
    }

    /// Quotes for the tickers currently stored in `kind`.
    pub async fn quotes_for(&self, kind: ListKind, mode: CacheMode) -> CacheLookup<QuoteReport> {
        let tickers = self.watchlist.tickers(kind).await;
        self.quotes(&tickers, mode).await
    }

    /// Classified news from the configured feeds.
    pub async fn news(&self, mode: CacheMode) -> CacheLookup<NewsReport> {
        self.news_from(&self.feeds, mode).await
    }

    /// Classified news from `sources`, cached per source set.
    pub async fn news_from(&self, sources: &[FeedSource], mode: CacheMode) -> CacheLookup<NewsReport> {
        let key = news_key(sources);
        self.news_cache
            .get_or_refresh(&key, None, mode, || {
                self.classifier.fetch_and_classify(sources, &self.topics)
            })
            .await
    }

    pub async fn sectors(&self, mode: CacheMode) -> CacheLookup<SectorLeaderboard> {
        let key = format!("sectors:{}", self.sectors_top_n);
        self.sector_cache
            .get_or_refresh(&key, None, mode, || {
                leaderboard(&self.fetcher, &self.sectors, self.sectors_top_n)
            })
            .await
    }

    /// Both lists, the sector board and the news buckets. A cache hit only if every part hit.
    pub async fn snapshot(&self, mode: CacheMode) -> CacheLookup<DashboardSnapshot> {
        let holdings = self.quotes_for(ListKind::Holdings, mode).await;
        let watch = self.quotes_for(ListKind::Watch, mode).await;
        let sectors = self.sectors(mode).await;
        let news = self.news(mode).await;

        let cache_hit = holdings.cache_hit && watch.cache_hit && sectors.cache_hit && news.cache_hit;
        let snapshot = DashboardSnapshot {
            holdings: holdings.value,
            watch: watch.value,
            sectors: sectors.value,
            news: news.value,
        };
        info!(
            status = snapshot.status(self.feeds.len()).as_str(),
            cache_hit,
            "dashboard snapshot"
        );

        CacheLookup {
            value: snapshot,
            cache_hit,
        }
    }

    /// Add `raw` to `kind` and drop cached quotes.
    pub async fn add_to_list(&self, kind: ListKind, raw: &str) -> Result<Ticker, ValidationError> {
        let ticker = self.watchlist.add(kind, raw).await?;
        self.quote_cache.invalidate_prefix(QUOTES_PREFIX).await;
        Ok(ticker)
    }

    /// Remove `raw` from `kind` and drop cached quotes.
    pub async fn remove_from_list(&self, kind: ListKind, raw: &str) -> Result<Ticker, ValidationError> {
        let ticker = self.watchlist.remove(kind, raw).await?;
        self.quote_cache.invalidate_prefix(QUOTES_PREFIX).await;
        Ok(ticker)
    }
}

fn ttl_cache<V: Clone + Send + Sync>(ttl: Duration) -> TtlCache<V> {
    if ttl.is_zero() {
        TtlCache::disabled()
    } else {
        TtlCache::new(ttl)
    }
}

fn quotes_key(tickers: &[Ticker]) -> String {
    let codes = tickers.iter().map(Ticker::as_str).collect::<Vec<_>>();
    format!("{QUOTES_PREFIX}{}", codes.join(","))
}

fn news_key(sources: &[FeedSource]) -> String {
    let parts = sources
        .iter()
        .map(|source| format!("{}={}:{}", source.label, source.url, u8::from(source.translate)))
        .collect::<Vec<_>>();
    format!("news:{}", parts.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_follow_input_sets() {
        let tickers = crate::parse_ticker_list("2330.tw, 2317.TW");
        assert_eq!(quotes_key(&tickers), "quotes:2330.TW,2317.TW");

        let source = FeedSource::new("cnyes", "https://news.test/rss", false).expect("valid source");
        assert_eq!(news_key(&[source]), "news:cnyes=https://news.test/rss:0");
    }

    #[test]
    fn from_config_accepts_defaults_offline() {
        let client = Arc::new(crate::http_client::StaticHttpClient::new());
        let dashboard =
            Dashboard::from_config(&DashboardConfig::default(), client).expect("defaults are valid");
        assert_eq!(dashboard.feeds().len(), 3);
        assert_eq!(dashboard.topics().fallback(), "其他");
    }
}
