use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Exchange-qualified ticker such as `2330.TW` or `AAPL`.
///
/// Only trimming and uppercasing are applied; digit-leading exchange codes are valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }

        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Code without the exchange suffix (`2330.TW` -> `2330`).
    pub fn base_code(&self) -> &str {
        match self.0.split_once('.') {
            Some((base, _)) if !base.is_empty() => base,
            _ => &self.0,
        }
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Ticker {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

/// Parse comma-separated ticker text, dropping blank entries.
pub fn parse_ticker_list(input: &str) -> Vec<Ticker> {
    input
        .split(',')
        .filter_map(|raw| Ticker::parse(raw).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_ticker() {
        let parsed = Ticker::parse(" 2330.tw ").expect("ticker should parse");
        assert_eq!(parsed.as_str(), "2330.TW");
        assert_eq!(parsed.base_code(), "2330");
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(Ticker::parse("   "), Err(ValidationError::EmptyTicker));
    }

    #[test]
    fn base_code_without_suffix_is_whole_ticker() {
        let parsed = Ticker::parse("AAPL").expect("ticker should parse");
        assert_eq!(parsed.base_code(), "AAPL");
    }

    #[test]
    fn ticker_list_skips_blank_segments() {
        let tickers = parse_ticker_list("2330.TW, ,2317.TW,,00878.TW ");
        let codes = tickers.iter().map(Ticker::as_str).collect::<Vec<_>>();
        assert_eq!(codes, vec!["2330.TW", "2317.TW", "00878.TW"]);
    }
}
