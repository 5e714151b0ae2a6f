//! Headline translation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheMode, TtlCache};
use crate::http_client::{HttpClient, HttpRequest};
use crate::SourceError;

pub const GOOGLE_TRANSLATE_BASE_URL: &str = "https://translate.googleapis.com";
pub const DEFAULT_TARGET_LANGUAGE: &str = "zh-TW";

/// Translation contract: one string in, one string out, source language auto-detected.
pub trait Translator: Send + Sync {
    fn translate<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>>;
}

/// Translator that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTranslator;

impl Translator for NoopTranslator {
    fn translate<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>> {
        Box::pin(async move { Ok(text.to_owned()) })
    }
}

/// Google `translate_a/single` endpoint with a fixed target language.
#[derive(Clone)]
pub struct GoogleTranslator {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    target: String,
    timeout_ms: u64,
}

impl GoogleTranslator {
    pub fn new(http_client: Arc<dyn HttpClient>, target: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: GOOGLE_TRANSLATE_BASE_URL.to_owned(),
            target: target.into(),
            timeout_ms: 5_000,
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

    pub fn target(&self) -> &str {
        &self.target
    }

    async fn request_translation(&self, text: &str) -> Result<String, SourceError> {
        let request = HttpRequest::get(format!("{}/translate_a/single", self.base_url))
            .with_query("client", "gtx")
            .with_query("sl", "auto")
            .with_query("tl", &self.target)
            .with_query("dt", "t")
            .with_query("q", text)
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|e| {
            SourceError::unavailable(format!("translate transport error: {}", e.message()))
        })?;

        match response.status {
            429 => return Err(SourceError::rate_limited("translate rate limited the request")),
            status if !(200..300).contains(&status) => {
                return Err(SourceError::unavailable(format!(
                    "translate returned status {status}"
                )))
            }
            _ => {}
        }

        parse_translation(&response.body)
    }
}

impl Translator for GoogleTranslator {
    fn translate<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>> {
        Box::pin(self.request_translation(text))
    }
}

/// Join the translated segments of a `translate_a/single` payload.
///
/// The payload is a nested array whose first element lists
/// `[translated, original, ...]` segments.
pub fn parse_translation(body: &str) -> Result<String, SourceError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse translation: {}", e)))?;

    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::malformed("translation payload has no segments"))?;

    let translated = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect::<String>();

    if translated.trim().is_empty() {
        return Err(SourceError::no_data("translation came back empty"));
    }
    Ok(translated)
}

/// Memoizes successful translations in a [`TtlCache`].
#[derive(Clone)]
pub struct CachedTranslator {
    inner: Arc<dyn Translator>,
    cache: TtlCache<String>,
}

impl CachedTranslator {
    pub fn new(inner: Arc<dyn Translator>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.len().await
    }
}

impl Translator for CachedTranslator {
    fn translate<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let lookup = self
                .cache
                .try_get_or_refresh(text, None, CacheMode::Use, || self.inner.translate(text))
                .await?;
            if lookup.cache_hit {
                debug!(chars = text.chars().count(), "translation served from cache");
            }
            Ok(lookup.value)
        })
    }
}

/// Share of non-whitespace characters in the CJK Unified Ideographs block.
pub fn local_script_ratio(text: &str) -> f64 {
    let (total, han) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0_usize, 0_usize), |(total, han), c| {
            (total + 1, han + usize::from(('\u{4e00}'..='\u{9fff}').contains(&c)))
        });

    if total == 0 {
        return 0.0;
    }
    han as f64 / total as f64
}
