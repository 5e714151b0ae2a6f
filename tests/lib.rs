// Shared fixtures for the behavior tests
pub use std::sync::Arc;
pub use tickerdesk_core::{HttpResponse, Ticker};

/// A Yahoo chart body with the given daily closes, oldest first.
pub fn chart(closes: &[f64], short_name: &str) -> HttpResponse {
    let closes = closes
        .iter()
        .map(|close| close.to_string())
        .collect::<Vec<_>>()
        .join(",");
    HttpResponse::ok(format!(
        r#"{{"chart":{{"result":[{{"meta":{{"shortName":"{short_name}"}},"indicators":{{"quote":[{{"close":[{closes}]}}]}}}}],"error":null}}}}"#
    ))
}

pub fn ticker(raw: &str) -> Ticker {
    Ticker::parse(raw).expect("valid ticker")
}

pub fn tickers(raw: &[&str]) -> Vec<Ticker> {
    raw.iter().map(|code| ticker(code)).collect()
}
