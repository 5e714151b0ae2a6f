//! Code → display-name lookup used when rendering quotes.

use std::collections::BTreeMap;

use crate::Ticker;

const CORPORATE_SUFFIXES: [&str; 10] = [
    " co., ltd.",
    " co.,ltd.",
    " co., ltd",
    " corporation",
    " company",
    " limited",
    " corp.",
    " corp",
    " inc.",
    " ltd.",
];

/// Static code → name table keyed by base code (`2330`, not `2330.TW`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    names: BTreeMap<String, String>,
    max_chars: usize,
}

impl NameTable {
    pub fn new(names: BTreeMap<String, String>, max_chars: usize) -> Self {
        let names = names
            .into_iter()
            .map(|(code, name)| (code.trim().to_uppercase(), name))
            .collect();
        Self { names, max_chars }
    }

    /// Table entry → cleaned provider short name → raw base code.
    pub fn resolve(&self, ticker: &Ticker, provider_name: Option<&str>) -> String {
        let base = ticker.base_code();
        if let Some(name) = self.names.get(base) {
            return name.clone();
        }

        provider_name
            .map(|name| shorten_provider_name(name, self.max_chars))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| base.to_owned())
    }
}

/// Trim whitespace and common corporate suffixes, then cap the length.
pub fn shorten_provider_name(name: &str, max_chars: usize) -> String {
    let mut cleaned = name.split_whitespace().collect::<Vec<_>>().join(" ");

    let lowered = cleaned.to_lowercase();
    if let Some(suffix) = CORPORATE_SUFFIXES
        .iter()
        .find(|suffix| lowered.ends_with(*suffix))
    {
        let keep = cleaned.chars().count().saturating_sub(suffix.chars().count());
        cleaned = cleaned.chars().take(keep).collect();
    }

    let cleaned = cleaned.trim_end_matches([',', ' ']);
    if max_chars == 0 {
        return cleaned.to_owned();
    }
    cleaned.chars().take(max_chars).collect::<String>().trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> NameTable {
        let mut names = BTreeMap::new();
        names.insert(String::from("2330"), String::from("台積電"));
        NameTable::new(names, 16)
    }

    #[test]
    fn table_entry_wins_over_provider_name() {
        let ticker = Ticker::parse("2330.TW").expect("valid ticker");
        assert_eq!(table().resolve(&ticker, Some("TSMC")), "台積電");
    }

    #[test]
    fn provider_name_is_cleaned_and_capped() {
        let ticker = Ticker::parse("2603.TW").expect("valid ticker");
        assert_eq!(
            table().resolve(&ticker, Some("  Evergreen Marine   Corporation ")),
            "Evergreen Marine"
        );
        assert_eq!(
            shorten_provider_name("TAIWAN SEMICONDUCTOR MANUFACTUR", 16),
            "TAIWAN SEMICONDU"
        );
    }

    #[test]
    fn falls_back_to_base_code() {
        let ticker = Ticker::parse("00878.TW").expect("valid ticker");
        assert_eq!(table().resolve(&ticker, None), "00878");
        assert_eq!(table().resolve(&ticker, Some("   ")), "00878");
    }

    #[test]
    fn strips_co_ltd_suffix() {
        assert_eq!(
            shorten_provider_name("Formosa Plastics Co., Ltd.", 0),
            "Formosa Plastics"
        );
    }
}
