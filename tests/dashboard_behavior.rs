//! Behavior tests for the dashboard facade
//!
//! Every collaborator runs against one canned transport, so request counts show
//! exactly when the cache served a view and when it went upstream.

use tickerdesk_core::config::CacheConfig;
use tickerdesk_core::{
    BatchStatus, CacheMode, Dashboard, DashboardConfig, FeedSource, HttpClient, HttpFeedFetcher,
    HttpResponse, ListKind, MemoryStore, NameTable, NewsClassifier, NoopTranslator, QuoteFetcher,
    Sector, SectorTable, StaticHttpClient, TopicBucket, TopicTable, Watchlist, YahooChartSource,
};
use tickerdesk_tests::{chart, ticker, Arc};

const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item><title>Cargo rates rise</title><link>https://wire.test/1</link></item>
</channel></rss>"#;

fn client() -> Arc<StaticHttpClient> {
    Arc::new(
        StaticHttpClient::new()
            .route("/chart/AAA.X", chart(&[10.0, 10.5], "Alpha"))
            .route("/chart/BBB.X", chart(&[20.0, 19.0], "Beta"))
            .route("/chart/CCC.X", chart(&[5.0, 5.0], "Gamma"))
            .route("wire.test/rss", HttpResponse::ok(RSS)),
    )
}

fn dashboard(client: &Arc<StaticHttpClient>) -> Dashboard {
    let http: Arc<dyn HttpClient> = client.clone();
    let source = YahooChartSource::new(Arc::clone(&http)).with_base_url("https://chart.test");
    let fetcher = QuoteFetcher::new(Arc::new(source), Arc::new(NameTable::default()));
    let classifier = NewsClassifier::new(
        Arc::new(HttpFeedFetcher::new(http)),
        Arc::new(NoopTranslator),
    );
    let store = MemoryStore::seeded([
        (ListKind::Holdings, vec![String::from("AAA.X")]),
        (ListKind::Watch, vec![String::from("BBB.X")]),
    ]);
    let topics = TopicTable::new(vec![TopicBucket::new("Shipping", ["cargo"])], "Other")
        .expect("valid topic table");
    let sectors = SectorTable::new(vec![
        Sector::new("Alpha", vec![ticker("AAA.X"), ticker("CCC.X")]),
        Sector::new("Beta", vec![ticker("BBB.X")]),
    ]);
    let feed = FeedSource::new("wire", "https://wire.test/rss", false).expect("valid source");

    Dashboard::new(fetcher, classifier, Watchlist::new(Arc::new(store)), topics)
        .with_feeds(vec![feed])
        .with_sectors(sectors, 2)
}

fn chart_requests(client: &StaticHttpClient) -> usize {
    client
        .requests()
        .iter()
        .filter(|request| request.url.contains("/chart/"))
        .count()
}

// =============================================================================
// Caching
// =============================================================================

#[tokio::test]
async fn when_quotes_are_requested_twice_second_call_is_served_from_cache() {
    // Given: A dashboard with default cache lifetimes
    let client = client();
    let dashboard = dashboard(&client);
    let tickers = vec![ticker("AAA.X"), ticker("BBB.X")];

    // When: The same ticker set is requested twice
    let first = dashboard.quotes(&tickers, CacheMode::Use).await;
    let second = dashboard.quotes(&tickers, CacheMode::Use).await;

    // Then: Only the first call reaches the provider
    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.value, second.value);
    assert_eq!(chart_requests(&client), 2);
}

#[tokio::test]
async fn when_refresh_is_requested_cache_is_skipped_and_rewritten() {
    // Given: A warm quote cache
    let client = client();
    let dashboard = dashboard(&client);
    let tickers = vec![ticker("AAA.X")];
    dashboard.quotes(&tickers, CacheMode::Use).await;

    // When: The caller forces a refresh, then reads normally
    let refreshed = dashboard.quotes(&tickers, CacheMode::Refresh).await;
    let cached = dashboard.quotes(&tickers, CacheMode::Use).await;

    // Then: The refresh went upstream and the next read hit the new entry
    assert!(!refreshed.cache_hit);
    assert!(cached.cache_hit);
    assert_eq!(chart_requests(&client), 2);
}

#[tokio::test]
async fn when_caching_is_disabled_every_call_goes_upstream() {
    // Given: Zero lifetimes for every view
    let client = client();
    let dashboard = dashboard(&client).with_cache(CacheConfig {
        quotes_ttl_secs: 0,
        news_ttl_secs: 0,
        sectors_ttl_secs: 0,
    });
    let tickers = vec![ticker("AAA.X")];

    // When: The same set is requested twice
    dashboard.quotes(&tickers, CacheMode::Use).await;
    let second = dashboard.quotes(&tickers, CacheMode::Use).await;

    // Then: Both calls fetched
    assert!(!second.cache_hit);
    assert_eq!(chart_requests(&client), 2);
}

// =============================================================================
// Lists
// =============================================================================

#[tokio::test]
async fn when_a_ticker_is_added_list_quotes_include_it_immediately() {
    // Given: Holdings quoted once and cached
    let client = client();
    let dashboard = dashboard(&client);
    let before = dashboard.quotes_for(ListKind::Holdings, CacheMode::Use).await;
    assert_eq!(before.value.quotes.len(), 1);

    // When: A ticker is added in lowercase
    let added = dashboard
        .add_to_list(ListKind::Holdings, " ccc.x ")
        .await
        .expect("valid ticker");

    // Then: The list and its quotes reflect the change
    assert_eq!(added.as_str(), "CCC.X");
    assert_eq!(
        dashboard.watchlist().entries(ListKind::Holdings).await,
        vec!["AAA.X", "CCC.X"]
    );
    let after = dashboard.quotes_for(ListKind::Holdings, CacheMode::Use).await;
    assert!(!after.cache_hit);
    assert_eq!(after.value.quotes.len(), 2);
}

#[tokio::test]
async fn when_a_ticker_is_removed_cached_quotes_are_dropped() {
    // Given: Watch list quotes are cached
    let client = client();
    let dashboard = dashboard(&client);
    dashboard.quotes_for(ListKind::Watch, CacheMode::Use).await;

    // When: The only watched ticker is removed
    dashboard
        .remove_from_list(ListKind::Watch, "BBB.X")
        .await
        .expect("valid ticker");

    // Then: The list is empty and no stale quote is served
    let after = dashboard.quotes_for(ListKind::Watch, CacheMode::Use).await;
    assert!(after.value.quotes.is_empty());
    assert_eq!(after.value.status(), BatchStatus::Complete);
}

#[tokio::test]
async fn when_a_blank_ticker_is_added_it_is_rejected() {
    // Given: A dashboard
    let client = client();
    let dashboard = dashboard(&client);

    // When: A blank ticker is added
    let result = dashboard.add_to_list(ListKind::Watch, "   ").await;

    // Then: Validation fails and the list is untouched
    assert!(result.is_err());
    assert_eq!(
        dashboard.watchlist().entries(ListKind::Watch).await,
        vec!["BBB.X"]
    );
}

// =============================================================================
// Views
// =============================================================================

#[tokio::test]
async fn when_sector_board_is_built_gainers_and_losers_are_ranked() {
    // Given: Three sector tickers moving up, down and flat
    let client = client();
    let dashboard = dashboard(&client);

    // When: The board is requested
    let board = dashboard.sectors(CacheMode::Use).await.value;

    // Then: Gainers descend and losers ascend by percentage change
    let gainers = board
        .gainers
        .iter()
        .map(|row| (row.sector.as_str(), row.quote.ticker.as_str()))
        .collect::<Vec<_>>();
    let losers = board
        .losers
        .iter()
        .map(|row| row.quote.ticker.as_str())
        .collect::<Vec<_>>();
    assert_eq!(gainers, vec![("Alpha", "AAA.X"), ("Alpha", "CCC.X")]);
    assert_eq!(losers, vec!["BBB.X", "CCC.X"]);
    assert_eq!(board.status(), BatchStatus::Complete);
}

#[tokio::test]
async fn when_snapshot_is_taken_twice_second_one_is_a_full_cache_hit() {
    // Given: A dashboard with all sources healthy
    let client = client();
    let dashboard = dashboard(&client);

    // When: Two snapshots are taken
    let first = dashboard.snapshot(CacheMode::Use).await;
    let second = dashboard.snapshot(CacheMode::Use).await;

    // Then: Every part is present and the second snapshot came from cache
    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    let snapshot = second.value;
    assert_eq!(snapshot.holdings.quotes.len(), 1);
    assert_eq!(snapshot.watch.quotes.len(), 1);
    let shipping = snapshot.news.bucket("Shipping").expect("topic bucket");
    assert_eq!(shipping.items.len(), 1);
    assert_eq!(snapshot.status(dashboard.feeds().len()), BatchStatus::Complete);
}

#[tokio::test]
async fn when_every_upstream_is_down_default_snapshot_is_failed() {
    // Given: The default configuration over a transport that answers nothing
    let dashboard = Dashboard::from_config(
        &DashboardConfig::default(),
        Arc::new(StaticHttpClient::new()),
    )
    .expect("defaults are valid");

    // When: A snapshot is taken
    let snapshot = dashboard.snapshot(CacheMode::Bypass).await;

    // Then: Every part failed, so the whole snapshot is failed
    assert!(!snapshot.cache_hit);
    let snapshot = snapshot.value;
    assert!(snapshot.holdings.quotes.is_empty());
    assert_eq!(snapshot.news.skipped.len(), dashboard.feeds().len());
    assert_eq!(snapshot.status(dashboard.feeds().len()), BatchStatus::Failed);
}
