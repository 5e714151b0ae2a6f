use serde::{Deserialize, Serialize};

use crate::Ticker;

/// Price direction of an instrument relative to its prior close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Percentage change is zero or positive.
    Up,
    Down,
}

impl Direction {
    pub fn from_pct(change_pct: f64) -> Self {
        if change_pct >= 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// Display color, Taiwan market convention (gains red, losses green).
    pub const fn color(self) -> &'static str {
        match self {
            Self::Up => "red",
            Self::Down => "green",
        }
    }

    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Up => "▲",
            Self::Down => "▼",
        }
    }
}

/// Coarse move label shown next to a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Surge,
    Plunge,
    Steady,
}

impl Trend {
    pub fn classify(change_pct: f64, threshold_pct: f64) -> Self {
        if change_pct >= threshold_pct {
            Self::Surge
        } else if change_pct <= -threshold_pct {
            Self::Plunge
        } else {
            Self::Steady
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Surge => "surge",
            Self::Plunge => "plunge",
            Self::Steady => "steady",
        }
    }
}

/// Resolved quote for one ticker. Built once per fetch and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub ticker: Ticker,
    pub name: String,
    pub price: f64,
    pub previous_close: f64,
    pub change: f64,
    /// Percentage change rounded to two decimals.
    pub change_pct: f64,
    pub direction: Direction,
    pub color: String,
    pub glyph: String,
    pub trend: Trend,
}

impl QuoteResult {
    pub fn from_closes(
        ticker: Ticker,
        name: impl Into<String>,
        price: f64,
        previous_close: f64,
        trend_threshold_pct: f64,
    ) -> Self {
        let change = price - previous_close;
        let change_pct = if previous_close != 0.0 {
            round_2dp(change / previous_close * 100.0)
        } else {
            0.0
        };
        let direction = Direction::from_pct(change_pct);

        Self {
            ticker,
            name: name.into(),
            price,
            previous_close,
            change,
            change_pct,
            direction,
            color: direction.color().to_owned(),
            glyph: direction.glyph().to_owned(),
            trend: Trend::classify(change_pct, trend_threshold_pct),
        }
    }
}

fn round_2dp(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // Avoid -0.00 leaking into direction checks.
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
