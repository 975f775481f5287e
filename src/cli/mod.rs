//! CLI command handling
//!
//! Loads configuration, builds the client and runner, and formats output.

use colored::Colorize;

use crate::client::{ApiClient, Params};
use crate::commands::{Commands, TargetArgs};
use crate::common::config::{ConfigFile, EnvironmentConfig};
use crate::common::logging::LogProvider;
use crate::common::{Error, Result};
use crate::testing::{self, RunOptions};

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when the command ran but tests failed.
pub fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run {
            target,
            data,
            filter,
            fail_fast,
            verbose,
        } => {
            let (config, env) = load_environment(&target)?;
            let logs = LogProvider::init(&config.logging)?;
            let client = ApiClient::new(env, logs.logger("api_client"))?;

            let cases = testing::load_test_cases(&data)?;
            let options = RunOptions {
                filter,
                fail_fast,
                verbose,
            };
            let report = testing::run_suite(&client, &cases, &options)?;

            if verbose {
                if let Some(path) = logs.log_file() {
                    println!("Log file: {}", path.display().to_string().dimmed());
                }
            }

            Ok(report.success())
        }

        Commands::Resolve {
            target,
            endpoint,
            params,
        } => {
            let (_, env) = load_environment(&target)?;
            let params = params
                .iter()
                .map(|pair| {
                    Params::parse_pair(pair).ok_or_else(|| {
                        Error::Config(format!(
                            "Invalid parameter '{}', expected key=value",
                            pair
                        ))
                    })
                })
                .collect::<Result<Params>>()?;

            println!("{}", env.resolve_endpoint(&endpoint, &params)?);
            Ok(true)
        }

        Commands::Endpoints { target } => {
            let (_, env) = load_environment(&target)?;
            print_endpoints(&env);
            Ok(true)
        }
    }
}

/// Load the configuration file and select the environment
///
/// `--env` wins over `$ENVIRONMENT`, which wins over the configured default.
fn load_environment(target: &TargetArgs) -> Result<(ConfigFile, EnvironmentConfig)> {
    let config = ConfigFile::load(&target.config)?;
    let env = match target.env.as_deref() {
        Some(name) => config.select_environment(Some(name))?,
        None => config.resolve_environment()?,
    };
    Ok((config, env))
}

fn print_endpoints(env: &EnvironmentConfig) {
    println!(
        "{} {} ({})",
        "Environment:".blue().bold(),
        env.name().white().bold(),
        env.base_url().dimmed()
    );

    let width = env.endpoints().map(|(name, _)| name.len()).max().unwrap_or(0);
    if width == 0 {
        println!("  No endpoints configured");
        return;
    }
    for (name, template) in env.endpoints() {
        println!("  {:<width$}  {}", name, template.as_str().dimmed(), width = width);
    }
}
