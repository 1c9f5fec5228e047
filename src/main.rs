use clap::Parser;
use garmin_strava_sync::common::metrics::RunTotals;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod cli;
mod shutdown;

use crate::cli::Cli;

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("garmin_strava_sync={default_level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.verbose, args.json_logs);

    let totals = RunTotals::install()
        .inspect_err(|_| warn!("A metrics recorder is already installed"))
        .ok();

    let interrupts = shutdown::install_signal_handler();
    let result = cli::cli_main(args, interrupts).await;
    if let Some(totals) = &totals {
        totals.log_summary();
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
