use std::io::Write;

use serde_json::Value;
use tickerdesk_core::Envelope;

use crate::cli::OutputFormat;
use crate::error::CliError;

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let payload = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(envelope)? + "\n",
        OutputFormat::Json => serde_json::to_string(envelope)? + "\n",
        OutputFormat::Table => render_table(envelope)?,
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(payload.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> Result<String, CliError> {
    let mut out = String::new();
    out.push_str(&format!("request_id  : {}\n", envelope.meta.request_id));
    out.push_str(&format!("generated_at: {}\n", envelope.meta.generated_at));
    out.push_str(&format!("latency_ms  : {}\n", envelope.meta.latency_ms));
    out.push_str(&format!("cache_hit   : {}\n", envelope.meta.cache_hit));

    let data = &envelope.data;
    if let Some(quotes) = data.get("quotes") {
        out.push_str(&quote_table(quotes));
    } else if data.get("holdings").is_some() {
        section(&mut out, "holdings", &quote_table(&data["holdings"]["quotes"]));
        section(&mut out, "watch", &quote_table(&data["watch"]["quotes"]));
        section(&mut out, "gainers", &quote_table(&data["sectors"]["gainers"]));
        section(&mut out, "losers", &quote_table(&data["sectors"]["losers"]));
        out.push_str(&news_listing(&data["news"]["buckets"]));
    } else if data.get("gainers").is_some() {
        section(&mut out, "gainers", &quote_table(&data["gainers"]));
        section(&mut out, "losers", &quote_table(&data["losers"]));
    } else if let Some(buckets) = data.get("buckets") {
        out.push_str(&news_listing(buckets));
    } else if let Some(lists) = data.get("lists").and_then(Value::as_object) {
        for (kind, tickers) in lists {
            let codes = tickers
                .as_array()
                .map(|codes| codes.iter().filter_map(Value::as_str).collect::<Vec<_>>())
                .unwrap_or_default();
            out.push_str(&format!("{kind:<9}: {}\n", codes.join(", ")));
        }
    } else {
        out.push_str("data:\n");
        for line in serde_json::to_string_pretty(data)?.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }

    if !envelope.meta.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &envelope.meta.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }

    if !envelope.errors.is_empty() {
        out.push_str("errors:\n");
        for error in &envelope.errors {
            match &error.subject {
                Some(subject) => {
                    out.push_str(&format!("  - {subject}: {} ({})\n", error.message, error.code))
                }
                None => out.push_str(&format!("  - {}: {}\n", error.code, error.message)),
            }
        }
    }

    Ok(out)
}

fn section(out: &mut String, title: &str, body: &str) {
    out.push_str(&format!("\n[{title}]\n"));
    out.push_str(body);
}

const NAME_COLUMN: usize = 16;

/// Terminal columns taken by `c`: East Asian wide and fullwidth characters take two.
fn char_width(c: char) -> usize {
    match u32::from(c) {
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD => 2,
        _ => 1,
    }
}

fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

/// Left-aligns `text` in `width` terminal columns; `format!` padding counts chars instead.
fn pad_to_width(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(display_width(text));
    format!("{text}{}", " ".repeat(padding))
}

fn quote_table(rows: &Value) -> String {
    let Some(rows) = rows.as_array().filter(|rows| !rows.is_empty()) else {
        return String::from("  (no quotes)\n");
    };

    let mut out = format!(
        "  {:<10} {} {:>10} {:>9} {:>8}   {}\n",
        "ticker",
        pad_to_width("name", NAME_COLUMN),
        "price",
        "change",
        "pct",
        "trend"
    );
    for row in rows {
        let text = |key: &str| row[key].as_str().unwrap_or_default().to_owned();
        let number = |key: &str| row[key].as_f64().unwrap_or_default();
        out.push_str(&format!(
            "  {:<10} {} {:>10.2} {:>+9.2} {:>+7.2}% {} {}\n",
            text("ticker"),
            pad_to_width(&text("name"), NAME_COLUMN),
            number("price"),
            number("change"),
            number("change_pct"),
            text("glyph"),
            text("trend"),
        ));
    }
    out
}

fn news_listing(buckets: &Value) -> String {
    let mut out = String::new();
    for bucket in buckets.as_array().into_iter().flatten() {
        let items = bucket["items"].as_array().map(Vec::as_slice).unwrap_or_default();
        out.push_str(&format!(
            "\n[{}] {} item(s)\n",
            bucket["label"].as_str().unwrap_or_default(),
            items.len()
        ));
        for item in items {
            out.push_str(&format!(
                "  - {}  ({}, {})\n    {}\n",
                item["title"].as_str().unwrap_or_default(),
                item["source"].as_str().unwrap_or_default(),
                item["published"].as_str().unwrap_or_default(),
                item["link"].as_str().unwrap_or_default(),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tickerdesk_core::EnvelopeMeta;

    #[test]
    fn quote_rows_show_signed_change_and_glyph() {
        let data = json!({
            "status": "complete",
            "quotes": [{
                "ticker": "AAA.X", "name": "AAA", "price": 10.5, "previous_close": 10.0,
                "change": 0.5, "change_pct": 5.0, "direction": "up", "color": "red",
                "glyph": "▲", "trend": "surge"
            }]
        });
        let table = render_table(&Envelope::success(EnvelopeMeta::new(3, false), data))
            .expect("table should render");

        assert!(table.contains("AAA.X"));
        assert!(table.contains("+5.00% ▲ surge"));
    }

    #[test]
    fn wide_names_keep_price_columns_aligned() {
        let row = |ticker: &str, name: &str| {
            json!({
                "ticker": ticker, "name": name, "price": 100.0, "change": 1.0,
                "change_pct": 1.0, "glyph": "▲", "trend": "rise"
            })
        };
        let table = quote_table(&json!([row("2330.TW", "台積電"), row("AAPL", "Apple")]));

        let price_column = table
            .lines()
            .filter_map(|line| line.find("100.00").map(|end| display_width(&line[..end])))
            .collect::<Vec<_>>();
        assert_eq!(price_column.len(), 2);
        assert_eq!(price_column[0], price_column[1]);
        assert_eq!(display_width("台積電"), 6);
    }

    #[test]
    fn news_buckets_list_empty_buckets_too() {
        let data = json!({
            "buckets": [
                {"label": "Tech", "items": [{"title": "New chip", "source": "wire", "published": "Mon, 06 Jan 2025", "link": "https://x.test/1"}]},
                {"label": "Other", "items": []}
            ]
        });
        let table = render_table(&Envelope::success(EnvelopeMeta::new(1, true), data))
            .expect("table should render");

        assert!(table.contains("[Tech] 1 item(s)"));
        assert!(table.contains("[Other] 0 item(s)"));
        assert!(table.contains("cache_hit   : true"));
    }
}
