mod barista;
mod config;
mod customer;
mod error;
mod events;
mod logging;
mod order_queue;
mod sim;
mod types;

use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};

use crate::config::{CliArgs, SimConfig};
use crate::events::ConsoleSink;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match SimConfig::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            eprintln!("{}", CliArgs::command().render_usage());
            return ExitCode::from(2);
        }
    };

    logging::init(args.verbose);

    match sim::run(&config, Arc::new(ConsoleSink::new())) {
        Ok(report) => {
            sim::print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}
