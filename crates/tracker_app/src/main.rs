mod app;
mod config;
mod logging;
mod render;

use std::process::ExitCode;

use clap::Parser;
use tracker_logging::tracker_error;

fn main() -> ExitCode {
    let cli = app::Cli::parse();
    match app::run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracker_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
