use std::process::ExitCode;
use std::time::Duration;

use tickerdesk_core::CacheMode;
use tracing::{info, warn};

use crate::cli::{Cli, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::{cache_mode, run_with_mode, Session};

/// Render the dashboard repeatedly; later renders reuse cache entries that have not expired.
pub async fn run(args: &WatchArgs, cli: &Cli, session: &Session) -> Result<ExitCode, CliError> {
    let interval = Duration::from_secs(args.interval_secs.max(1));
    let mut mode = cache_mode(cli);
    let mut iteration = 0_u64;

    let exit_code = loop {
        iteration += 1;
        let outcome = run_with_mode(cli, session, mode).await?;
        if cli.format == OutputFormat::Table && iteration > 1 {
            println!();
        }
        output::render(&outcome.envelope, cli.format, cli.pretty)?;
        let exit_code = outcome.exit_code();
        info!(iteration, cache_hit = outcome.envelope.meta.cache_hit, "dashboard rendered");

        if args.iterations.is_some_and(|limit| iteration >= limit) {
            break exit_code;
        }
        mode = CacheMode::Use;

        let interrupted = tokio::select! {
            _ = tokio::time::sleep(interval) => false,
            signal = tokio::signal::ctrl_c() => {
                if let Err(error) = signal {
                    warn!(error = %error, "failed to listen for interrupt");
                }
                true
            }
        };
        if interrupted {
            break exit_code;
        }
    };

    Ok(ExitCode::from(exit_code))
}
