//! # Domain Models
//!
//! Canonical types shared by the quote fetcher, news classifier and dashboard.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Trimmed, uppercased exchange-qualified symbol |
//! | [`QuoteResult`] | Price, prior close, change and presentation attributes |
//! | [`Direction`] | Up (non-negative) or down, with color and glyph |
//! | [`Trend`] | Surge / plunge / steady label |
//! | [`FeedSource`] | Feed URL plus translation flag |
//! | [`FeedEntry`] | Raw parsed feed entry |
//! | [`NewsItem`] | Classified, deduplicated news entry |
//! | [`NewsBucket`] | Topic label and its items |
//! | [`Skipped`] | Item dropped from a batch and why |
//! | [`BatchStatus`] | Complete, partial or failed batch |

mod news;
mod quote;
mod report;
mod ticker;

pub use news::{char_prefix, FeedEntry, FeedSource, NewsBucket, NewsItem};
pub use quote::{Direction, QuoteResult, Trend};
pub use report::{BatchStatus, Skipped};
pub use ticker::{parse_ticker_list, Ticker};
