//! Test runner implementation
//!
//! Dispatches each test case through the [`ApiClient`] and checks the
//! response against the case's expectations. Cases run one after another in
//! file order.

use colored::Colorize;
use serde_json::Value;

use crate::client::{ApiClient, HttpMethod, Response};
use crate::common::config::EnvironmentConfig;
use crate::common::{Error, Result};

use super::config::TestCase;

/// How a single test case ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    /// One message per failed assertion, each prefixed with the case name
    Failed(Vec<String>),
    /// The case could not be evaluated (transport, decode or resolution error)
    Errored(String),
    /// The case was not dispatched
    Skipped(String),
}

impl TestOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TestOutcome::Failed(_) | TestOutcome::Errored(_))
    }
}

/// Outcome of one test case, tagged with its name
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub name: String,
    pub outcome: TestOutcome,
}

/// Options for [`run_suite`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only run cases whose name contains this text
    pub filter: Option<String>,
    /// Stop after the first failed or errored case
    pub fail_fast: bool,
    /// Print method, endpoint and status for every case
    pub verbose: bool,
}

/// Results of a suite run
#[derive(Debug, Default)]
pub struct SuiteReport {
    pub results: Vec<CaseResult>,
}

impl SuiteReport {
    fn count(&self, pred: impl Fn(&TestOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Failed(_)))
    }

    pub fn errored(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Errored(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TestOutcome::Skipped(_)))
    }

    /// True when nothing failed or errored
    pub fn success(&self) -> bool {
        !self.results.iter().any(|r| r.outcome.is_failure())
    }
}

/// Check that every dispatchable case names a configured endpoint
///
/// Cases with an unsupported method are never dispatched, so they are not
/// checked.
pub fn validate_endpoints<'a>(
    env: &EnvironmentConfig,
    cases: impl IntoIterator<Item = &'a TestCase>,
) -> Result<()> {
    for case in cases {
        if case.method.parse::<HttpMethod>().is_err() {
            continue;
        }
        if !env.has_endpoint(&case.endpoint) {
            return Err(Error::Config(format!(
                "Test case '{}' references endpoint '{}', which is not defined in configuration",
                case.name, case.endpoint
            )));
        }
    }
    Ok(())
}

/// Run test cases in order and print one line per case
///
/// Fails only for configuration problems found before the first request.
pub fn run_suite(client: &ApiClient, cases: &[TestCase], options: &RunOptions) -> Result<SuiteReport> {
    let selected: Vec<&TestCase> = cases
        .iter()
        .filter(|case| {
            options
                .filter
                .as_deref()
                .map_or(true, |needle| case.name.contains(needle))
        })
        .collect();

    validate_endpoints(client.environment(), selected.iter().copied())?;

    println!(
        "\n{} {} ({} environment)",
        "Running Tests:".blue().bold(),
        selected.len().to_string().white().bold(),
        client.environment().name()
    );

    let mut report = SuiteReport::default();
    for case in selected {
        if options.verbose {
            println!(
                "  {} {} {}",
                "→".dimmed(),
                case.method.to_uppercase().dimmed(),
                case.endpoint.dimmed()
            );
        }

        let outcome = run_case(client, case);
        print_outcome(&case.name, &outcome);

        let stop = options.fail_fast && outcome.is_failure();
        report.results.push(CaseResult {
            name: case.name.clone(),
            outcome,
        });
        if stop {
            println!("  {}", "Stopping after first failure (--fail-fast)".yellow());
            break;
        }
    }

    print_summary(&report);
    Ok(report)
}

/// Dispatch one test case and evaluate its assertions
pub fn run_case(client: &ApiClient, case: &TestCase) -> TestOutcome {
    let method = match case.method.parse::<HttpMethod>() {
        Ok(method) => method,
        Err(e) => return TestOutcome::Skipped(e.to_string()),
    };

    let payload = if method.has_body() {
        case.payload.as_ref()
    } else {
        None
    };

    let response = client.send(
        method,
        &case.endpoint,
        case.query.as_ref(),
        payload,
        case.headers.as_ref(),
        &case.params,
    );

    match response {
        Ok(response) => check_response(case, &response),
        Err(e) => TestOutcome::Errored(format!("{}: {}", case.name, e)),
    }
}

/// Evaluate a case's assertions against a received response
///
/// Key and length assertions only apply when the response declares a JSON
/// content type; otherwise they are skipped rather than failed.
pub fn check_response(case: &TestCase, response: &Response) -> TestOutcome {
    let name = &case.name;
    let mut failures = Vec::new();

    if response.status() != case.expected_status {
        failures.push(format!(
            "{} expected status {} but got {}",
            name,
            case.expected_status,
            response.status()
        ));
    }

    let wants_shape = case.expected_keys.is_some() || case.expected_min_length.is_some();
    if wants_shape && response.is_json() {
        let body: Value = match response.json() {
            Ok(body) => body,
            Err(e) => {
                let message = format!("{} failed to parse JSON response: {}", name, e);
                // A status mismatch already decides the case; keep it visible
                if failures.is_empty() {
                    return TestOutcome::Errored(message);
                }
                failures.push(message);
                return TestOutcome::Failed(failures);
            }
        };

        if let Some(keys) = &case.expected_keys {
            match body.as_object() {
                Some(object) => {
                    for key in keys {
                        if !object.contains_key(key) {
                            failures.push(format!("{} missing key '{}' in response", name, key));
                        }
                    }
                }
                None => failures.push(format!(
                    "{} expected JSON object response, got {}",
                    name,
                    json_type(&body)
                )),
            }
        }

        if let Some(min) = case.expected_min_length {
            match body.as_array() {
                Some(items) if items.len() >= min => {}
                Some(items) => failures.push(format!(
                    "{} expected at least {} items, got {}",
                    name,
                    min,
                    items.len()
                )),
                None => failures.push(format!("{} expected list response", name)),
            }
        }
    }

    if failures.is_empty() {
        TestOutcome::Passed
    } else {
        TestOutcome::Failed(failures)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn print_outcome(name: &str, outcome: &TestOutcome) {
    match outcome {
        TestOutcome::Passed => println!("  {} {}", "✓".green(), name),
        TestOutcome::Failed(messages) => {
            println!("  {} {}", "✗".red(), name);
            for message in messages {
                println!("      {}", message.red());
            }
        }
        TestOutcome::Errored(message) => {
            println!("  {} {}", "!".red().bold(), name);
            println!("      {}", message.red());
        }
        TestOutcome::Skipped(reason) => {
            println!("  {} {} ({})", "-".yellow(), name, reason.dimmed())
        }
    }
}

fn print_summary(report: &SuiteReport) {
    let line = format!(
        "{} passed, {} failed, {} errors, {} skipped",
        report.passed(),
        report.failed(),
        report.errored(),
        report.skipped()
    );
    if report.success() {
        println!("\n{} {}\n", "✓".green().bold(), line.green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), line.red().bold());
    }
}
