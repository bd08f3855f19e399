use crate::app::App;
use crate::cli::Args;
use crate::logging::setup_logging;
use clap::Parser;
use mapset::config::Config;
use std::process::ExitCode;
use tracing::{error, info};

mod app;
mod cli;
mod logging;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config before anything else so startup logs are never silently dropped
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rev = env!("MAPSET_BUILD_REV"),
        "starting mapset"
    );

    let app = App::new(&config);
    match app.run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "command failed");
            ExitCode::FAILURE
        }
    }
}
