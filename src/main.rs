//! API Harness - data-driven HTTP API testing
//!
//! Replays the YAML test cases of a data file against the endpoints named in
//! a YAML configuration file.

use clap::Parser;
use harness::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "api-harness", about = "Data-driven HTTP API test harness")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    match cli::dispatch(cli.command) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
