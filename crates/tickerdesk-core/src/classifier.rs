//! News classifier: dedupe by fingerprint, optional translation, first-match bucketing.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::feeds::FeedFetcher;
use crate::translate::{local_script_ratio, Translator};
use crate::{
    char_prefix, BatchStatus, FeedEntry, FeedSource, NewsBucket, NewsItem, Skipped,
    ValidationError,
};

/// One topic label and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicBucket {
    pub label: String,
    pub keywords: Vec<String>,
}

impl TopicBucket {
    pub fn new<K: Into<String>>(label: impl Into<String>, keywords: impl IntoIterator<Item = K>) -> Self {
        Self {
            label: label.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered keyword table plus the catch-all label. Order decides ties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTable {
    topics: Vec<TopicBucket>,
    fallback: String,
    // Lowercased keywords, parallel to `topics`.
    needles: Vec<Vec<String>>,
}

impl TopicTable {
    pub fn new(topics: Vec<TopicBucket>, fallback: impl Into<String>) -> Result<Self, ValidationError> {
        let fallback = fallback.into();
        if fallback.trim().is_empty() {
            return Err(ValidationError::EmptyTopicLabel);
        }

        let mut labels = HashSet::with_capacity(topics.len() + 1);
        for topic in &topics {
            if topic.label.trim().is_empty() {
                return Err(ValidationError::EmptyTopicLabel);
            }
            if !labels.insert(topic.label.as_str()) {
                return Err(ValidationError::DuplicateTopic {
                    label: topic.label.clone(),
                });
            }
            if topic.keywords.iter().any(|keyword| keyword.trim().is_empty()) {
                return Err(ValidationError::EmptyKeyword {
                    label: topic.label.clone(),
                });
            }
        }
        if labels.contains(fallback.as_str()) {
            return Err(ValidationError::DuplicateTopic { label: fallback });
        }

        let needles = topics
            .iter()
            .map(|topic| topic.keywords.iter().map(|k| k.to_lowercase()).collect())
            .collect();

        Ok(Self {
            topics,
            fallback,
            needles,
        })
    }

    pub fn topics(&self) -> &[TopicBucket] {
        &self.topics
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Label of the first topic with a keyword contained in `title`, ignoring case.
    pub fn classify(&self, title: &str) -> Option<&str> {
        let haystack = title.to_lowercase();
        self.topics
            .iter()
            .zip(&self.needles)
            .find(|(_, needles)| needles.iter().any(|needle| haystack.contains(needle.as_str())))
            .map(|(topic, _)| topic.label.as_str())
    }

    /// Every label in bucket order, fallback last.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.topics
            .iter()
            .map(|topic| topic.label.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
    }
}

/// Tunables for a classification run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    /// Entries read from each feed, in feed order.
    pub per_source_cap: usize,
    pub fingerprint_chars: usize,
    pub date_prefix_chars: usize,
    /// Titles with at least this share of Han characters are left untranslated.
    pub local_script_threshold: f64,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            per_source_cap: 15,
            fingerprint_chars: 10,
            date_prefix_chars: 16,
            local_script_threshold: 0.3,
        }
    }
}

/// Result of one classification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsReport {
    /// One bucket per topic label in table order, then the fallback bucket.
    pub buckets: Vec<NewsBucket>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Skipped>,
    /// Translation fallbacks; the affected items keep their original title.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub duplicates_dropped: usize,
}

impl NewsReport {
    pub fn bucket(&self, label: &str) -> Option<&NewsBucket> {
        self.buckets.iter().find(|bucket| bucket.label == label)
    }

    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.items.len()).sum()
    }

    pub fn items(&self) -> impl Iterator<Item = &NewsItem> {
        self.buckets.iter().flat_map(|bucket| bucket.items.iter())
    }

    /// `Failed` only when every source was skipped.
    pub fn status(&self, sources: usize) -> BatchStatus {
        BatchStatus::from_counts(sources.saturating_sub(self.skipped.len()), self.skipped.len())
    }
}

/// Fingerprint of a raw title: its first `chars` characters.
pub fn fingerprint(title: &str, chars: usize) -> String {
    char_prefix(title, chars).to_owned()
}

/// Fetches feeds and sorts their entries into topic buckets.
#[derive(Clone)]
pub struct NewsClassifier {
    fetcher: Arc<dyn FeedFetcher>,
    translator: Arc<dyn Translator>,
    settings: NewsSettings,
}

impl NewsClassifier {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, translator: Arc<dyn Translator>) -> Self {
        Self {
            fetcher,
            translator,
            settings: NewsSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: NewsSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> NewsSettings {
        self.settings
    }

    /// Fetch each source in order and classify its entries.
    ///
    /// A failing source contributes nothing and is recorded in `skipped`. The
    /// fingerprint set lives only for this call.
    pub async fn fetch_and_classify(&self, sources: &[FeedSource], topics: &TopicTable) -> NewsReport {
        let mut report = NewsReport {
            buckets: topics.labels().map(NewsBucket::empty).collect(),
            skipped: Vec::new(),
            warnings: Vec::new(),
            duplicates_dropped: 0,
        };
        let mut seen = HashSet::new();

        for source in sources {
            let entries = match self.fetcher.fetch(source).await {
                Ok(entries) => entries,
                Err(error) => {
                    warn!(feed = %source.label, error = %error, "skipping feed");
                    report.skipped.push(Skipped::new(source.label.as_str(), &error));
                    continue;
                }
            };
            debug!(feed = %source.label, entries = entries.len(), "classifying feed");

            for entry in entries.into_iter().take(self.settings.per_source_cap) {
                let fingerprint = fingerprint(&entry.title, self.settings.fingerprint_chars);
                if !seen.insert(fingerprint.clone()) {
                    report.duplicates_dropped += 1;
                    continue;
                }

                let item = self.build_item(source, entry, fingerprint, topics, &mut report.warnings).await;
                let index = match item.topic.as_deref() {
                    Some(label) => topics
                        .topics()
                        .iter()
                        .position(|topic| topic.label == label)
                        .unwrap_or(topics.topics().len()),
                    None => topics.topics().len(),
                };
                report.buckets[index].items.push(item);
            }
        }

        info!(
            sources = sources.len(),
            items = report.item_count(),
            skipped = report.skipped.len(),
            duplicates = report.duplicates_dropped,
            "news classified"
        );
        report
    }

    async fn build_item(
        &self,
        source: &FeedSource,
        entry: FeedEntry,
        fingerprint: String,
        topics: &TopicTable,
        warnings: &mut Vec<String>,
    ) -> NewsItem {
        let mut title = entry.title.clone();
        let mut translated = false;

        if source.translate && local_script_ratio(&entry.title) < self.settings.local_script_threshold {
            match self.translator.translate(&entry.title).await {
                Ok(text) if !text.trim().is_empty() => {
                    title = text.trim().to_owned();
                    translated = true;
                }
                Ok(_) => {
                    warn!(feed = %source.label, "translation returned empty text, keeping original");
                    warnings.push(format!("{}: empty translation for '{}'", source.label, entry.title));
                }
                Err(error) => {
                    warn!(feed = %source.label, error = %error, "translation failed, keeping original");
                    warnings.push(format!("{}: {}", source.label, error));
                }
            }
        }

        let topic = topics.classify(&title).map(str::to_owned);

        NewsItem {
            title,
            original_title: entry.title,
            link: entry.link,
            published: char_prefix(&entry.published, self.settings.date_prefix_chars).to_owned(),
            source: source.label.clone(),
            topic,
            fingerprint,
            translated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TopicTable {
        TopicTable::new(
            vec![
                TopicBucket::new("Tech", ["chip", "AI"]),
                TopicBucket::new("Shipping", ["cargo", "freight"]),
            ],
            "Other",
        )
        .expect("valid table")
    }

    #[test]
    fn earliest_topic_wins_and_matching_ignores_case() {
        let table = table();
        assert_eq!(table.classify("Chip freight surges"), Some("Tech"));
        assert_eq!(table.classify("FREIGHT costs fall"), Some("Shipping"));
        assert_eq!(table.classify("Weather report"), None);
    }

    #[test]
    fn labels_end_with_fallback() {
        assert_eq!(table().labels().collect::<Vec<_>>(), vec!["Tech", "Shipping", "Other"]);
    }

    #[test]
    fn rejects_malformed_tables() {
        let duplicate = TopicTable::new(
            vec![TopicBucket::new("A", ["x"]), TopicBucket::new("A", ["y"])],
            "Other",
        );
        assert!(matches!(duplicate, Err(ValidationError::DuplicateTopic { .. })));

        let shadowed = TopicTable::new(vec![TopicBucket::new("Other", ["x"])], "Other");
        assert!(matches!(shadowed, Err(ValidationError::DuplicateTopic { .. })));

        let blank_keyword = TopicTable::new(vec![TopicBucket::new("A", [" "])], "Other");
        assert!(matches!(blank_keyword, Err(ValidationError::EmptyKeyword { .. })));

        let blank_label = TopicTable::new(vec![TopicBucket::new("", ["x"])], "Other");
        assert_eq!(blank_label, Err(ValidationError::EmptyTopicLabel));

        assert_eq!(
            TopicTable::new(Vec::new(), " "),
            Err(ValidationError::EmptyTopicLabel)
        );
    }

    #[test]
    fn fingerprint_takes_leading_characters() {
        assert_eq!(fingerprint("Chip stocks rally", 10), "Chip stock");
        assert_eq!(fingerprint("台積電", 10), "台積電");
    }
}
