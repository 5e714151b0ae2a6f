//! Syndication feed fetching and RSS/Atom parsing.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest};
use crate::{FeedEntry, FeedSource, SourceError};

/// Feed retrieval contract used by the news classifier.
pub trait FeedFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        source: &'a FeedSource,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FeedEntry>, SourceError>> + Send + 'a>>;
}

/// Fetches feeds over HTTP GET and parses them with [`parse_feed`].
#[derive(Clone)]
pub struct HttpFeedFetcher {
    http_client: Arc<dyn HttpClient>,
    timeout_ms: u64,
}

impl HttpFeedFetcher {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            timeout_ms: 10_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch<'a>(
        &'a self,
        source: &'a FeedSource,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FeedEntry>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let request = HttpRequest::get(source.url.as_str())
                .with_header("accept", "application/rss+xml, application/atom+xml, text/xml")
                .with_timeout_ms(self.timeout_ms);

            let response = self.http_client.execute(request).await.map_err(|e| {
                SourceError::unavailable(format!("feed '{}' transport error: {}", source.label, e.message()))
            })?;

            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "feed '{}' returned status {}",
                    source.label, response.status
                )));
            }

            let entries = parse_feed(&response.body)?;
            debug!(feed = %source.label, entries = entries.len(), "parsed feed");
            Ok(entries)
        })
    }
}

/// Parse an RSS 2.0, RSS 1.0 (RDF) or Atom document.
///
/// Entries without a title are dropped; titles are trimmed. The date is taken
/// from `pubDate`, `published`, `dc:date` or `updated`, whichever comes first.
pub fn parse_feed(body: &str) -> Result<Vec<FeedEntry>, SourceError> {
    let root = root_element(body)
        .ok_or_else(|| SourceError::malformed("feed body has no root element"))?;

    let entries = match root.as_str() {
        "rss" => {
            let document: RssDocument = from_xml(body)?;
            document
                .channel
                .items
                .into_iter()
                .map(RssItem::into_entry)
                .collect::<Vec<_>>()
        }
        "RDF" => {
            let document: RdfDocument = from_xml(body)?;
            document
                .items
                .into_iter()
                .map(RssItem::into_entry)
                .collect::<Vec<_>>()
        }
        "feed" => {
            let document: AtomFeed = from_xml(body)?;
            document
                .entries
                .into_iter()
                .map(AtomEntry::into_entry)
                .collect::<Vec<_>>()
        }
        other => {
            return Err(SourceError::malformed(format!(
                "unsupported feed root element '{other}'"
            )))
        }
    };

    Ok(entries.into_iter().flatten().collect())
}

fn from_xml<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, SourceError> {
    quick_xml::de::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse feed: {}", e)))
}

fn root_element(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                return Some(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RdfDocument {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<String>,
    #[serde(rename = "pubDate", default)]
    pub_date: Option<String>,
    // `dc:date`; the deserializer sees the local name only.
    #[serde(rename = "date", default)]
    dc_date: Option<String>,
}

impl RssItem {
    fn into_entry(self) -> Option<FeedEntry> {
        let title = non_empty(self.title)?;
        let link = self
            .links
            .into_iter()
            .map(|link| link.trim().to_owned())
            .find(|link| !link.is_empty())
            .unwrap_or_default();
        let published = non_empty(self.pub_date)
            .or_else(|| non_empty(self.dc_date))
            .unwrap_or_default();

        Some(FeedEntry::new(title, link, published))
    }
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

impl AtomEntry {
    fn into_entry(self) -> Option<FeedEntry> {
        let title = non_empty(self.title.map(|text| text.value))?;
        let link = self
            .links
            .iter()
            .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.first())
            .map(|link| link.href.trim().to_owned())
            .unwrap_or_default();
        let published = non_empty(self.published)
            .or_else(|| non_empty(self.updated))
            .unwrap_or_default();

        Some(FeedEntry::new(title, link, published))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpResponse, StaticHttpClient};
    use crate::SourceErrorKind;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Markets</title>
    <atom:link href="https://example.test/rss" rel="self"/>
    <item>
      <title><![CDATA[ Chip stocks rally on AI demand ]]></title>
      <link>https://example.test/a</link>
      <pubDate>Mon, 06 Jan 2025 08:30:00 GMT</pubDate>
      <category>tech</category>
      <category>markets</category>
    </item>
    <item>
      <link>https://example.test/untitled</link>
    </item>
    <item>
      <title>Freight rates &amp; cargo volumes climb</title>
      <link>https://example.test/b</link>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Tech</title>
  <entry>
    <title type="html">Startup raises Series B</title>
    <link rel="replies" href="https://example.test/replies"/>
    <link rel="alternate" href="https://example.test/post"/>
    <updated>2025-01-06T09:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items_and_drops_untitled_entries() {
        let entries = parse_feed(RSS).expect("rss should parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Chip stocks rally on AI demand");
        assert_eq!(entries[0].link, "https://example.test/a");
        assert_eq!(entries[0].published, "Mon, 06 Jan 2025 08:30:00 GMT");
        assert_eq!(entries[1].title, "Freight rates & cargo volumes climb");
        assert_eq!(entries[1].published, "");
    }

    #[test]
    fn parses_atom_entries_preferring_alternate_link() {
        let entries = parse_feed(ATOM).expect("atom should parse");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Startup raises Series B");
        assert_eq!(entries[0].link, "https://example.test/post");
        assert_eq!(entries[0].published, "2025-01-06T09:00:00Z");
    }

    #[test]
    fn parses_rdf_items_dated_with_dublin_core() {
        const RDF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/"
         xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel rdf:about="https://example.test/">
    <title>Wire</title>
  </channel>
  <item rdf:about="https://example.test/c">
    <title>Cargo rates rise</title>
    <link>https://example.test/c</link>
    <dc:date>2025-01-06T08:30:00+09:00</dc:date>
  </item>
</rdf:RDF>"#;

        let entries = parse_feed(RDF).expect("rdf should parse");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Cargo rates rise");
        assert_eq!(entries[0].link, "https://example.test/c");
        assert_eq!(entries[0].published, "2025-01-06T08:30:00+09:00");
    }

    #[test]
    fn rss_items_fall_back_to_dublin_core_date() {
        const RSS_DC: &str = r#"<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <item>
      <title>Steel output climbs</title>
      <link>https://example.test/s</link>
      <dc:date>2025-01-07T10:00:00Z</dc:date>
    </item>
  </channel>
</rss>"#;

        let entries = parse_feed(RSS_DC).expect("rss should parse");
        assert_eq!(entries[0].published, "2025-01-07T10:00:00Z");
    }

    #[test]
    fn non_feed_documents_are_malformed() {
        let error = parse_feed("<html><body>oops</body></html>").expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Malformed);

        let error = parse_feed("").expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Malformed);
    }

    #[tokio::test]
    async fn http_fetcher_reports_bad_status_as_unavailable() {
        let client = Arc::new(
            StaticHttpClient::new()
                .route("/ok", HttpResponse::ok(RSS))
                .route("/down", HttpResponse::with_status(503, "")),
        );
        let fetcher = HttpFeedFetcher::new(client);

        let ok = FeedSource::new("ok", "https://example.test/ok", false).expect("valid source");
        let down = FeedSource::new("down", "https://example.test/down", false).expect("valid source");

        assert_eq!(fetcher.fetch(&ok).await.expect("feed should load").len(), 2);
        let error = fetcher.fetch(&down).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    }
}
