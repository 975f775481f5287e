//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::common::paths::{CONFIG_FILE_NAME, TEST_DATA_PATH};

#[derive(Subcommand)]
pub enum Commands {
    /// Run the test cases of a data file against the selected environment
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// YAML file with a `tests` list
        #[arg(long, short, default_value = TEST_DATA_PATH)]
        data: PathBuf,

        /// Only run test cases whose name contains this text
        #[arg(long, short = 'k')]
        filter: Option<String>,

        /// Stop after the first failed or errored test case
        #[arg(long, short = 'x')]
        fail_fast: bool,

        /// Print method and endpoint before each test case
        #[arg(long, short)]
        verbose: bool,
    },

    /// Print the full URL for an endpoint
    Resolve {
        #[command(flatten)]
        target: TargetArgs,

        /// Logical endpoint name from the configuration file
        endpoint: String,

        /// Path parameters as key=value (e.g. id=42)
        params: Vec<String>,
    },

    /// List the configured endpoints and their path templates
    Endpoints {
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Options selecting the configuration file and environment
#[derive(Args)]
pub struct TargetArgs {
    /// Configuration file (falls back to the user config directory)
    #[arg(long, short, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Environment to use instead of $ENVIRONMENT or the configured default
    #[arg(long, short)]
    pub env: Option<String>,
}
