//! Dashboard configuration: JSON file plus environment overrides.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::{NewsSettings, TopicBucket, TopicTable};
use crate::market_data::YAHOO_CHART_BASE_URL;
use crate::quotes::QuoteSettings;
use crate::sectors::{Sector, SectorTable};
use crate::translate::{DEFAULT_TARGET_LANGUAGE, GOOGLE_TRANSLATE_BASE_URL};
use crate::watchlist::ListKind;
use crate::{parse_ticker_list, CoreError, FeedSource, Ticker, ValidationError};

pub const CONFIG_PATH_ENV: &str = "TICKERDESK_CONFIG";
pub const LIST_ENDPOINT_ENV: &str = "TICKERDESK_LIST_ENDPOINT";
pub const LIST_USER_ENV: &str = "TICKERDESK_USER";

/// Complete dashboard configuration. Every section falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub http: HttpConfig,
    pub quotes: QuoteConfig,
    /// Base code → display name.
    pub names: BTreeMap<String, String>,
    pub news: NewsConfig,
    pub watchlist: WatchlistConfig,
    pub sectors: SectorConfig,
    pub cache: CacheConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            quotes: QuoteConfig::default(),
            names: default_names(),
            news: NewsConfig::default(),
            watchlist: WatchlistConfig::default(),
            sectors: SectorConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: format!("tickerdesk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    pub lookback: usize,
    pub trend_threshold_pct: f64,
    pub name_max_chars: usize,
    pub base_url: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        let settings = QuoteSettings::default();
        Self {
            lookback: settings.lookback,
            trend_threshold_pct: settings.trend_threshold_pct,
            name_max_chars: 16,
            base_url: YAHOO_CHART_BASE_URL.to_owned(),
        }
    }
}

impl QuoteConfig {
    pub fn settings(&self) -> QuoteSettings {
        QuoteSettings {
            lookback: self.lookback,
            trend_threshold_pct: self.trend_threshold_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub feeds: Vec<FeedSource>,
    pub topics: Vec<TopicBucket>,
    pub fallback_label: String,
    pub per_source_cap: usize,
    pub fingerprint_chars: usize,
    pub date_prefix_chars: usize,
    pub translation: TranslationConfig,
}

impl Default for NewsConfig {
    fn default() -> Self {
        let settings = NewsSettings::default();
        Self {
            feeds: default_feeds(),
            topics: default_topics(),
            fallback_label: String::from("其他"),
            per_source_cap: settings.per_source_cap,
            fingerprint_chars: settings.fingerprint_chars,
            date_prefix_chars: settings.date_prefix_chars,
            translation: TranslationConfig::default(),
        }
    }
}

impl NewsConfig {
    pub fn settings(&self) -> NewsSettings {
        NewsSettings {
            per_source_cap: self.per_source_cap,
            fingerprint_chars: self.fingerprint_chars,
            date_prefix_chars: self.date_prefix_chars,
            local_script_threshold: self.translation.local_script_threshold,
        }
    }

    pub fn topic_table(&self) -> Result<TopicTable, ValidationError> {
        TopicTable::new(self.topics.clone(), self.fallback_label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub target: String,
    pub base_url: String,
    pub local_script_threshold: f64,
    pub cache_ttl_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target: DEFAULT_TARGET_LANGUAGE.to_owned(),
            base_url: GOOGLE_TRANSLATE_BASE_URL.to_owned(),
            local_script_threshold: NewsSettings::default().local_script_threshold,
            cache_ttl_secs: 3_600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    /// List store URL; the in-process store is used when unset.
    pub endpoint: Option<String>,
    pub user: Option<String>,
    pub timeout_ms: u64,
    /// Seed lists, also used by the in-process store.
    pub holdings: Vec<String>,
    pub watch: Vec<String>,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            user: None,
            timeout_ms: 5_000,
            holdings: split_codes("2330.TW, 2317.TW, 00878.TW, 2412.TW"),
            watch: split_codes("2603.TW, 1101.TW, 1301.TW, 2618.TW"),
        }
    }
}

impl WatchlistConfig {
    pub fn seed(&self, kind: ListKind) -> &[String] {
        match kind {
            ListKind::Holdings => &self.holdings,
            ListKind::Watch => &self.watch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorConfig {
    pub table: SectorTable,
    pub top_n: usize,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            table: default_sectors(),
            top_n: 5,
        }
    }
}

/// Cache lifetimes in seconds; zero disables that cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub quotes_ttl_secs: u64,
    pub news_ttl_secs: u64,
    pub sectors_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            quotes_ttl_secs: 60,
            news_ttl_secs: 600,
            sectors_ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn quotes_ttl(&self) -> Duration {
        Duration::from_secs(self.quotes_ttl_secs)
    }

    pub fn news_ttl(&self) -> Duration {
        Duration::from_secs(self.news_ttl_secs)
    }

    pub fn sectors_ttl(&self) -> Duration {
        Duration::from_secs(self.sectors_ttl_secs)
    }
}

impl DashboardConfig {
    /// Read a JSON config file. Missing sections and fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = fs::read_to_string(path).map_err(|source| CoreError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// `path`, else `$TICKERDESK_CONFIG`, else defaults; then environment overrides and validation.
    pub fn resolve(path: Option<&Path>) -> Result<Self, CoreError> {
        let path = path.map(Path::to_path_buf).or_else(config_path_from_env);
        let mut config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `TICKERDESK_LIST_ENDPOINT` / `TICKERDESK_USER` style overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(LIST_ENDPOINT_ENV).filter(|value| !value.trim().is_empty()) {
            self.watchlist.endpoint = Some(endpoint.trim().to_owned());
        }
        if let Some(user) = lookup(LIST_USER_ENV).filter(|value| !value.trim().is_empty()) {
            self.watchlist.user = Some(user.trim().to_owned());
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_zero("http.timeout_ms", self.http.timeout_ms as usize)?;
        require_non_zero("quotes.lookback", self.quotes.lookback)?;
        require_range("quotes.trend_threshold_pct", self.quotes.trend_threshold_pct, 0.0, 100.0)?;
        require_non_zero("news.per_source_cap", self.news.per_source_cap)?;
        require_non_zero("news.fingerprint_chars", self.news.fingerprint_chars)?;
        require_range(
            "news.translation.local_script_threshold",
            self.news.translation.local_script_threshold,
            0.0,
            1.0,
        )?;
        require_non_zero("sectors.top_n", self.sectors.top_n)?;

        for feed in &self.news.feeds {
            if feed.url.trim().is_empty() {
                return Err(ValidationError::EmptyFeedUrl {
                    label: feed.label.clone(),
                });
            }
        }
        self.news.topic_table()?;
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
}

fn require_non_zero(field: &'static str, value: usize) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::ZeroConfigValue { field });
    }
    Ok(())
}

fn require_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::ConfigOutOfRange { field, min, max });
    }
    Ok(())
}

fn split_codes(raw: &str) -> Vec<String> {
    parse_ticker_list(raw).into_iter().map(String::from).collect()
}

fn default_feeds() -> Vec<FeedSource> {
    [
        ("台灣焦點", "https://news.cnyes.com/rss/cat/200", false),
        ("美國財經", "https://finance.yahoo.com/news/rssindex", true),
        ("AI 科技", "https://techcrunch.com/feed/", true),
    ]
    .into_iter()
    .map(|(label, url, translate)| FeedSource {
        label: label.to_owned(),
        url: url.to_owned(),
        translate,
    })
    .collect()
}

// Matching is by substring: English keywords must not occur inside common words.
fn default_topics() -> Vec<TopicBucket> {
    vec![
        TopicBucket::new(
            "半導體/AI",
            ["台積電", "晶片", "半導體", "輝達", "人工智慧", "chip", "semiconductor", "Nvidia", "artificial intelligence"],
        ),
        TopicBucket::new("航運", ["航運", "貨櫃", "運價", "長榮", "陽明", "萬海", "shipping", "cargo", "freight"]),
        TopicBucket::new(
            "金融/利率",
            ["金融", "銀行", "升息", "降息", "聯準會", "Federal Reserve", "central bank", "interest rate"],
        ),
        TopicBucket::new("傳產/原物料", ["水泥", "塑化", "鋼鐵", "油價", "cement", "plastic", "steel", "crude oil"]),
    ]
}

fn default_sectors() -> SectorTable {
    let sector = |label: &str, codes: &str| -> Sector { Sector::new(label, parse_ticker_list(codes)) };
    SectorTable::new(vec![
        sector("水泥/傳產", "1101.TW, 1102.TW, 2105.TW"),
        sector("塑化", "1301.TW, 1303.TW, 1326.TW"),
        sector("航運", "2603.TW, 2609.TW, 2615.TW"),
        sector("電子/AI", "2330.TW, 2317.TW, 2454.TW, 3231.TW, 2382.TW"),
        sector("金融", "2881.TW, 2882.TW, 2891.TW"),
    ])
}

/// Display names for the default lists and sector table.
pub fn default_names() -> BTreeMap<String, String> {
    [
        ("00878", "國泰永續高股息"),
        ("1101", "台泥"),
        ("1102", "亞泥"),
        ("1301", "台塑"),
        ("1303", "南亞"),
        ("1326", "台化"),
        ("2105", "正新"),
        ("2317", "鴻海"),
        ("2330", "台積電"),
        ("2382", "廣達"),
        ("2412", "中華電"),
        ("2454", "聯發科"),
        ("2603", "長榮"),
        ("2609", "陽明"),
        ("2615", "萬海"),
        ("2618", "長榮航"),
        ("2881", "富邦金"),
        ("2882", "國泰金"),
        ("2891", "中信金"),
        ("3231", "緯創"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_owned(), name.to_owned()))
    .collect()
}

/// Tickers seeded into `kind`, parsed.
pub fn seed_tickers(config: &WatchlistConfig, kind: ListKind) -> Vec<Ticker> {
    config
        .seed(kind)
        .iter()
        .filter_map(|code| Ticker::parse(code).ok())
        .collect()
}
