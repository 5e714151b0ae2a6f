//! CLI argument definitions for tickerdesk.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quotes` | Quote table for tickers or a stored list |
//! | `news` | Classified news buckets |
//! | `sectors` | Sector gainers and losers |
//! | `watchlist` | List, add or remove stored tickers |
//! | `dashboard` | Full snapshot |
//! | `watch` | Re-render the snapshot on an interval |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--config` | `$TICKERDESK_CONFIG` | JSON config file |
//! | `--refresh` | `false` | Ignore cached values and refetch |
//! | `--timeout-ms` | config | Per-request timeout in ms |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tickerdesk_core::ListKind;

/// Quotes, news and watchlists for a small personal market dashboard.
#[derive(Debug, Parser)]
#[command(
    name = "tickerdesk",
    author,
    version,
    about = "Personal market dashboard: quotes, sector movers and classified news"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// JSON config file; falls back to $TICKERDESK_CONFIG, then built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Skip cached values and refetch everything.
    #[arg(long, global = true, default_value_t = false)]
    pub refresh: bool,

    /// Per-request timeout in milliseconds, overriding the config file.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text tables for terminal display.
    Table,
    /// Single JSON envelope.
    Json,
}

/// Stored list selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListArg {
    Holdings,
    Watch,
}

impl From<ListArg> for ListKind {
    fn from(value: ListArg) -> Self {
        match value {
            ListArg::Holdings => ListKind::Holdings,
            ListArg::Watch => ListKind::Watch,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Quotes for the given tickers, or for a stored list.
    ///
    ///   tickerdesk quotes 2330.TW 2317.TW
    ///   tickerdesk quotes --list watch --format table
    Quotes(QuotesArgs),

    /// Fetch the configured feeds and sort headlines into topic buckets.
    News(NewsArgs),

    /// Top gainers and losers across the sector table.
    Sectors(SectorsArgs),

    /// Manage the holdings and watch lists.
    Watchlist(WatchlistArgs),

    /// Holdings, watch list, sector movers and news in one envelope.
    Dashboard,

    /// Re-render the dashboard every interval. Cached values are reused until they expire.
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
pub struct QuotesArgs {
    /// Tickers such as 2330.TW; comma-separated values are split.
    pub tickers: Vec<String>,

    /// Quote a stored list instead. Defaults to holdings when no tickers are given.
    #[arg(long, value_enum, conflicts_with = "tickers")]
    pub list: Option<ListArg>,
}

#[derive(Debug, Args)]
pub struct NewsArgs {
    /// Keep every headline in its original language.
    #[arg(long, default_value_t = false)]
    pub no_translate: bool,
}

#[derive(Debug, Args)]
pub struct SectorsArgs {
    /// Rows per side of the leaderboard.
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Debug, Args)]
pub struct WatchlistArgs {
    #[command(subcommand)]
    pub command: WatchlistCommand,
}

#[derive(Debug, Subcommand)]
pub enum WatchlistCommand {
    /// Show stored tickers, both lists unless one is chosen.
    List {
        #[arg(long, value_enum)]
        list: Option<ListArg>,
    },
    /// Add a ticker to a list.
    Add {
        #[arg(value_enum)]
        list: ListArg,
        ticker: String,
    },
    /// Remove a ticker from a list.
    Remove {
        #[arg(value_enum)]
        list: ListArg,
        ticker: String,
    },
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between renders.
    #[arg(long, default_value_t = 60)]
    pub interval_secs: u64,

    /// Stop after this many renders; runs until interrupted when omitted.
    #[arg(long)]
    pub iterations: Option<u64>,
}
