mod dashboard;
mod news;
mod quotes;
mod sectors;
pub mod watch;
mod watchlist;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tickerdesk_core::{
    BatchStatus, CacheMode, Dashboard, DashboardConfig, Envelope, EnvelopeError, EnvelopeMeta,
    ReqwestHttpClient, Skipped,
};

use crate::cli::{Cli, Command, SectorsArgs};
use crate::error::CliError;

/// Dashboard plus facts about how it was wired.
pub struct Session {
    pub dashboard: Dashboard,
    /// False when lists live only in this process.
    pub lists_persisted: bool,
}

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub cache_hit: bool,
    pub status: BatchStatus,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            cache_hit: false,
            status: BatchStatus::Complete,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_skipped<'a>(mut self, skipped: impl IntoIterator<Item = &'a Skipped>) -> Self {
        self.errors.extend(skipped.into_iter().map(EnvelopeError::from));
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }

    pub fn with_status(mut self, status: BatchStatus) -> Self {
        self.status = status;
        self
    }
}

/// Rendered envelope and the batch status that decides the exit code.
pub struct Outcome {
    pub envelope: Envelope<Value>,
    pub status: BatchStatus,
}

impl Outcome {
    pub const fn exit_code(&self) -> u8 {
        match self.status {
            BatchStatus::Complete => 0,
            BatchStatus::Partial => 3,
            BatchStatus::Failed => 5,
        }
    }
}

/// Resolve the config, apply command-line overrides and wire the dashboard.
pub fn build_dashboard(cli: &Cli) -> Result<Session, CliError> {
    let mut config = DashboardConfig::resolve(cli.config.as_deref())?;

    if let Some(timeout_ms) = cli.timeout_ms {
        config.http.timeout_ms = timeout_ms;
    }
    match &cli.command {
        Command::News(args) if args.no_translate => config.news.translation.enabled = false,
        Command::Sectors(SectorsArgs { top: Some(top) }) => config.sectors.top_n = *top,
        _ => {}
    }

    let http_client = Arc::new(ReqwestHttpClient::new(&config.http.user_agent));
    let dashboard = Dashboard::from_config(&config, http_client)?;

    Ok(Session {
        dashboard,
        lists_persisted: config.watchlist.endpoint.is_some(),
    })
}

pub fn cache_mode(cli: &Cli) -> CacheMode {
    if cli.refresh {
        CacheMode::Refresh
    } else {
        CacheMode::Use
    }
}

pub async fn run(cli: &Cli, session: &Session) -> Result<Outcome, CliError> {
    run_with_mode(cli, session, cache_mode(cli)).await
}

pub async fn run_with_mode(cli: &Cli, session: &Session, mode: CacheMode) -> Result<Outcome, CliError> {
    let started = Instant::now();
    let dashboard = &session.dashboard;

    let command_result = match &cli.command {
        Command::Quotes(args) => quotes::run(args, dashboard, mode).await?,
        Command::News(_) => news::run(dashboard, mode).await?,
        Command::Sectors(_) => sectors::run(dashboard, mode).await?,
        Command::Watchlist(args) => watchlist::run(args, session).await?,
        Command::Dashboard | Command::Watch(_) => dashboard::run(dashboard, mode).await?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        cache_hit,
        status,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = EnvelopeMeta::new(latency_ms, cache_hit);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Outcome {
        envelope: Envelope::with_errors(meta, data, errors)?,
        status,
    })
}
