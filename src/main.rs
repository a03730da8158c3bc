mod errors;
mod measurement;
mod results;
mod run;
mod session;
mod tui;
mod units;

use std::io;
use std::process;

use clap::{CommandFactory, FromArgMatches, Parser};
use clap_verbosity_flag::Verbosity;
use colored::Colorize;
use crossterm::tty::IsTty;
use log::debug;
use ratatui::backend::CrosstermBackend;
use tokio::signal;

use crate::errors::{exit_codes, format_error_for_display, MeasurementError};
use crate::measurement::{MeasurementConfig, SpeedtestCli};
use crate::run::run_speed_test;
use crate::session::RunSession;
use crate::tui::{DisplayMode, ProgressRenderer, Ticker};

/// Measure ping, download and upload speed with live progress bars.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity,
}

fn long_version() -> String {
    match option_env!("SPEEDCHECK_BUILD_GIT_HASH") {
        Some(hash) => format!("{} (rev {})", env!("CARGO_PKG_VERSION"), hash),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = Cli::command().long_version(long_version()).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let mode = DisplayMode::detect(io::stdout().is_tty());
    debug!("Display mode: {:?}", mode);

    let renderer = match mode {
        DisplayMode::Tui => ProgressRenderer::new(|| Ok(CrosstermBackend::new(io::stdout()))),
        DisplayMode::Silent => ProgressRenderer::headless(),
    };
    let mut session = RunSession::new(renderer, Ticker::default());
    let config = MeasurementConfig::default();

    let outcome = tokio::select! {
        result = run_speed_test(&SpeedtestCli, &config, &mut session) => result,
        _ = signal::ctrl_c() => Err(MeasurementError::Interrupted),
    };

    match outcome {
        Ok(summary) => {
            println!("{}", summary);
            process::exit(exit_codes::SUCCESS);
        }
        Err(error) => {
            if matches!(error, MeasurementError::Interrupted) {
                session.finish();
            }
            eprintln!("{}", format_error_for_display(&error).red().bold());
            process::exit(error.exit_code());
        }
    }
}
