//! Client for the external holdings/watch list store.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::http_client::{HttpClient, HttpRequest};
use crate::{SourceError, Ticker, ValidationError};

/// Which list a ticker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Holdings,
    Watch,
}

impl ListKind {
    pub const ALL: [ListKind; 2] = [ListKind::Holdings, ListKind::Watch];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Holdings => "holdings",
            Self::Watch => "watch",
        }
    }
}

impl Display for ListKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "holdings" => Ok(Self::Holdings),
            "watch" => Ok(Self::Watch),
            _ => Err(ValidationError::InvalidListKind {
                value: value.to_owned(),
            }),
        }
    }
}

/// External list store contract.
pub trait WatchlistStore: Send + Sync {
    fn read<'a>(
        &'a self,
        kind: ListKind,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, SourceError>> + Send + 'a>>;

    fn add<'a>(
        &'a self,
        kind: ListKind,
        ticker: &'a Ticker,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>>;

    fn remove<'a>(
        &'a self,
        kind: ListKind,
        ticker: &'a Ticker,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>>;
}

/// Spreadsheet-backed web app addressed with `?action=read|add|remove&type=…`.
#[derive(Clone)]
pub struct AppsScriptStore {
    http_client: Arc<dyn HttpClient>,
    endpoint: String,
    user: Option<String>,
    timeout_ms: u64,
}

impl AppsScriptStore {
    pub fn new(http_client: Arc<dyn HttpClient>, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
            user: None,
            timeout_ms: 5_000,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.user = (!user.trim().is_empty()).then(|| user.trim().to_owned());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn request(&self, action: &str, kind: ListKind, code: Option<&str>) -> HttpRequest {
        let mut request = HttpRequest::get(self.endpoint.as_str())
            .with_query("action", action)
            .with_query("type", kind.as_str())
            .with_timeout_ms(self.timeout_ms);
        if let Some(user) = &self.user {
            request = request.with_query("user", user);
        }
        if let Some(code) = code {
            request = request.with_query("code", code);
        }
        request
    }

    async fn send(&self, request: HttpRequest) -> Result<String, SourceError> {
        let response = self.http_client.execute(request).await.map_err(|e| {
            SourceError::unavailable(format!("list store transport error: {}", e.message()))
        })?;
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "list store returned status {}",
                response.status
            )));
        }
        Ok(response.body)
    }

    async fn read_list(&self, kind: ListKind) -> Result<Vec<String>, SourceError> {
        let body = self.send(self.request("read", kind, None)).await?;
        let tickers = parse_list_body(&body)?;
        debug!(list = %kind, tickers = tickers.len(), "read list from store");
        Ok(tickers)
    }

    async fn mutate(&self, action: &str, kind: ListKind, ticker: &Ticker) -> Result<(), SourceError> {
        // Body is ignored; only transport and status matter.
        self.send(self.request(action, kind, Some(ticker.as_str())))
            .await
            .map(|_| ())
    }
}

impl WatchlistStore for AppsScriptStore {
    fn read<'a>(
        &'a self,
        kind: ListKind,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, SourceError>> + Send + 'a>> {
        Box::pin(self.read_list(kind))
    }

    fn add<'a>(
        &'a self,
        kind: ListKind,
        ticker: &'a Ticker,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>> {
        Box::pin(self.mutate("add", kind, ticker))
    }

    fn remove<'a>(
        &'a self,
        kind: ListKind,
        ticker: &'a Ticker,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>> {
        Box::pin(self.mutate("remove", kind, ticker))
    }
}

/// Parse a read response: a JSON array of strings or numbers.
///
/// Spreadsheet cells holding purely numeric codes come back as numbers, so
/// `2330` and `"2330.TW"` are both accepted. Blank and non-scalar elements are skipped.
pub fn parse_list_body(body: &str) -> Result<Vec<String>, SourceError> {
    let values: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("list store returned invalid JSON: {}", e)))?;

    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            Value::String(text) => Some(text.trim().to_owned()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect())
}

/// In-process store; add is idempotent per list.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: Mutex<BTreeMap<ListKind, Vec<String>>>,
}

impl MemoryStore {
    pub fn seeded(lists: impl IntoIterator<Item = (ListKind, Vec<String>)>) -> Self {
        Self {
            lists: Mutex::new(lists.into_iter().collect()),
        }
    }
}

impl WatchlistStore for MemoryStore {
    fn read<'a>(
        &'a self,
        kind: ListKind,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, SourceError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.lists.lock().await.get(&kind).cloned().unwrap_or_default()) })
    }

    fn add<'a>(
        &'a self,
        kind: ListKind,
        ticker: &'a Ticker,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let mut lists = self.lists.lock().await;
            let list = lists.entry(kind).or_default();
            if !list.iter().any(|code| code == ticker.as_str()) {
                list.push(ticker.as_str().to_owned());
            }
            Ok(())
        })
    }

    fn remove<'a>(
        &'a self,
        kind: ListKind,
        ticker: &'a Ticker,
    ) -> Pin<Box<dyn Future<Output = Result<(), SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(list) = self.lists.lock().await.get_mut(&kind) {
                list.retain(|code| code != ticker.as_str());
            }
            Ok(())
        })
    }
}

/// Store facade that never fails: store errors degrade to an empty list or a no-op.
#[derive(Clone)]
pub struct Watchlist {
    store: Arc<dyn WatchlistStore>,
}

impl Watchlist {
    pub fn new(store: Arc<dyn WatchlistStore>) -> Self {
        Self { store }
    }

    /// Raw entries as stored, or empty when the store is unreachable.
    pub async fn entries(&self, kind: ListKind) -> Vec<String> {
        match self.store.read(kind).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(list = %kind, error = %error, "list store read failed, using empty list");
                Vec::new()
            }
        }
    }

    /// Parsed tickers, blanks dropped, store order kept.
    pub async fn tickers(&self, kind: ListKind) -> Vec<Ticker> {
        self.entries(kind)
            .await
            .iter()
            .filter_map(|entry| Ticker::parse(entry).ok())
            .collect()
    }

    /// Validate `raw` and ask the store to add it. Returns the parsed ticker.
    pub async fn add(&self, kind: ListKind, raw: &str) -> Result<Ticker, ValidationError> {
        let ticker = Ticker::parse(raw)?;
        if let Err(error) = self.store.add(kind, &ticker).await {
            warn!(list = %kind, ticker = %ticker, error = %error, "list store add failed");
        }
        Ok(ticker)
    }

    pub async fn remove(&self, kind: ListKind, raw: &str) -> Result<Ticker, ValidationError> {
        let ticker = Ticker::parse(raw)?;
        if let Err(error) = self.store.remove(kind, &ticker).await {
            warn!(list = %kind, ticker = %ticker, error = %error, "list store remove failed");
        }
        Ok(ticker)
    }
}
