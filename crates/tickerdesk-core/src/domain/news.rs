use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// One syndication feed polled by the news classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub label: String,
    pub url: String,
    /// Titles from this feed are translated when they are mostly non-local script.
    #[serde(default)]
    pub translate: bool,
}

impl FeedSource {
    pub fn new(
        label: impl Into<String>,
        url: impl Into<String>,
        translate: bool,
    ) -> Result<Self, ValidationError> {
        let label = label.into();
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ValidationError::EmptyFeedUrl { label });
        }
        Ok(Self {
            label,
            url,
            translate,
        })
    }
}

/// Raw entry as parsed from a feed, before dedupe and classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: String,
}

impl FeedEntry {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        published: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published: published.into(),
        }
    }
}

/// Classified news item retained after dedupe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub original_title: String,
    pub link: String,
    pub published: String,
    pub source: String,
    /// Matched topic label; `None` for items in the fallback bucket.
    pub topic: Option<String>,
    pub fingerprint: String,
    pub translated: bool,
}

/// Named collection of classified items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsBucket {
    pub label: String,
    pub items: Vec<NewsItem>,
}

impl NewsBucket {
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            items: Vec::new(),
        }
    }
}

/// First `chars` characters of `text`, counted by Unicode scalar value.
pub fn char_prefix(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_prefix_respects_multibyte_characters() {
        assert_eq!(char_prefix("台積電法說會釋出利多消息", 3), "台積電");
        assert_eq!(char_prefix("short", 10), "short");
        assert_eq!(char_prefix("", 4), "");
    }

    #[test]
    fn feed_source_requires_url() {
        let err = FeedSource::new("cnyes", "  ", false).expect_err("must fail");
        assert!(matches!(err, ValidationError::EmptyFeedUrl { .. }));
    }
}
