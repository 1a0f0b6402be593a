//! CLI support for the movement test-data generator.
//!
//! This module provides argument parsing, the confirmation gate guarding
//! replay, and the driver flow. The binary delegates to these functions so
//! the behaviour can be exercised in tests without spawning a process.

use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use mockable::DefaultClock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use url::Url;

use crate::error::{OutputError, TransportError};
use crate::generator::{DatasetPlan, MovementGenerator};
use crate::http::HttpMovementTransport;
use crate::output::write_pretty_json;
use crate::pools::IdentityPools;
use crate::replay::{ReplayClient, write_notice};

/// Default API base URL.
const DEFAULT_ENDPOINT: &str = "http://localhost:5001";

/// Default dataset file.
const DEFAULT_OUTPUT: &str = "test_movements.json";

/// Default replay results file.
const DEFAULT_RESULTS: &str = "test_results.json";

/// Default pause between replay requests, in milliseconds.
const DEFAULT_DELAY_MS: u64 = 100;

/// Parsed options for the generator CLI.
#[derive(Debug, Clone)]
pub struct Options {
    endpoint: Url,
    seed: Option<u64>,
    normal_count: Option<usize>,
    transfer_runs: Option<usize>,
    delay_ms: u64,
    output: Utf8PathBuf,
    results: Utf8PathBuf,
    assume_yes: bool,
}

impl Options {
    /// Returns the API base URL replayed movements are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the dataset output path.
    #[must_use]
    pub fn output(&self) -> &Utf8Path {
        &self.output
    }

    /// Returns the replay results path.
    #[must_use]
    pub fn results(&self) -> &Utf8Path {
        &self.results
    }
}

/// Outcome of parsing CLI arguments.
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    /// Show help output and exit successfully.
    Help,
    /// Continue with the parsed options.
    Options(Options),
}

/// Parses CLI arguments into generator options.
///
/// # Errors
///
/// Returns [`CliError`] when a flag is missing its value, a number or URL
/// cannot be parsed, or an argument is not recognised.
///
/// # Example
///
/// ```
/// use movement_data::testgen_cli::{ParseOutcome, parse_args};
///
/// let args = vec!["--seed".to_string(), "42".to_string()];
/// let outcome = parse_args(args.into_iter()).expect("parse args");
///
/// assert!(matches!(outcome, ParseOutcome::Options(_)));
/// ```
pub fn parse_args<I>(mut args: I) -> Result<ParseOutcome, CliError>
where
    I: Iterator<Item = String>,
{
    let mut endpoint: Option<String> = None;
    let mut seed: Option<u64> = None;
    let mut normal_count: Option<usize> = None;
    let mut transfer_runs: Option<usize> = None;
    let mut delay_ms: Option<u64> = None;
    let mut output: Option<Utf8PathBuf> = None;
    let mut results: Option<Utf8PathBuf> = None;
    let mut assume_yes = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(ParseOutcome::Help),
            "--endpoint" => {
                let value = next_value(&mut args, "--endpoint")?;
                endpoint = Some(value);
            }
            "--seed" => {
                let value = next_value(&mut args, "--seed")?;
                seed = Some(parse_number(&value, "--seed")?);
            }
            "--normal-count" => {
                let value = next_value(&mut args, "--normal-count")?;
                normal_count = Some(parse_number(&value, "--normal-count")?);
            }
            "--transfer-runs" => {
                let value = next_value(&mut args, "--transfer-runs")?;
                transfer_runs = Some(parse_number(&value, "--transfer-runs")?);
            }
            "--delay-ms" => {
                let value = next_value(&mut args, "--delay-ms")?;
                delay_ms = Some(parse_number(&value, "--delay-ms")?);
            }
            "--output" => {
                let value = next_value(&mut args, "--output")?;
                output = Some(Utf8PathBuf::from(value));
            }
            "--results" => {
                let value = next_value(&mut args, "--results")?;
                results = Some(Utf8PathBuf::from(value));
            }
            "--yes" => assume_yes = true,
            _ => return Err(CliError::UnknownArgument { value: arg }),
        }
    }

    let endpoint_value = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned());
    let parsed_endpoint = Url::parse(&endpoint_value).map_err(|error| CliError::InvalidEndpoint {
        value: endpoint_value.clone(),
        message: error.to_string(),
    })?;

    Ok(ParseOutcome::Options(Options {
        endpoint: parsed_endpoint,
        seed,
        normal_count,
        transfer_runs,
        delay_ms: delay_ms.unwrap_or(DEFAULT_DELAY_MS),
        output: output.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT)),
        results: results.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_RESULTS)),
        assume_yes,
    }))
}

/// Yes/no gate guarding replay.
pub trait ConfirmationGate {
    /// Asks the question and returns whether the user affirmed.
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] when the prompt cannot be written or the answer
    /// cannot be read.
    fn confirm(&mut self, prompt: &str) -> Result<bool, CliError>;
}

/// Gate that prompts on stdout and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirmation;

impl ConfirmationGate for StdinConfirmation {
    fn confirm(&mut self, prompt: &str) -> Result<bool, CliError> {
        let prompt_error = |error: io::Error| CliError::Prompt {
            message: error.to_string(),
        };

        let mut out = io::stdout().lock();
        write!(out, "{prompt} ")
            .and_then(|()| out.flush())
            .map_err(prompt_error)?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer).map_err(prompt_error)?;
        Ok(is_affirmative(&answer))
    }
}

/// Returns whether an answer counts as a yes.
fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    )
}

/// Generates the dataset, writes it to disk, and optionally replays it.
///
/// The dataset file is always written; replay happens only when `--yes` was
/// supplied or the gate affirms. Replay results are written after the full
/// sequence has been processed.
///
/// # Errors
///
/// Returns [`CliError`] when an output file cannot be written, the prompt
/// fails, or the HTTP transport cannot be constructed. Per-record replay
/// failures are captured in the results file, not raised.
pub fn run(
    options: &Options,
    gate: &mut dyn ConfirmationGate,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let seed = options.seed.unwrap_or_else(random_seed);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let pools = IdentityPools::new(&mut rng);
    let generator = MovementGenerator::new(pools, Arc::new(DefaultClock));

    let mut plan = DatasetPlan::default();
    if let Some(count) = options.normal_count {
        plan.normal_movements = count;
    }
    if let Some(runs) = options.transfer_runs {
        plan.transfer_runs = runs;
    }

    write_notice(out, &format!("Generating movement dataset (seed {seed})..."));
    let movements = generator.dataset(&mut rng, &plan);

    write_pretty_json(&options.output, &movements)?;
    write_notice(
        out,
        &format!("Saved {} movements to {}", movements.len(), options.output),
    );

    if !options.assume_yes && !gate.confirm("Send to API? (y/n):")? {
        write_notice(out, "Replay skipped.");
        return Ok(());
    }

    let transport = HttpMovementTransport::new(&options.endpoint)?;
    let client = ReplayClient::new(
        Box::new(transport),
        Duration::from_millis(options.delay_ms),
    );
    write_notice(
        out,
        &format!("Sending {} movements to {}...", movements.len(), options.endpoint),
    );
    let results = client.replay(&movements, out);

    write_pretty_json(&options.results, &results)?;
    write_notice(
        out,
        &format!("Saved {} results to {}", results.len(), options.results),
    );
    Ok(())
}

fn next_value<I>(args: &mut I, flag: &'static str) -> Result<String, CliError>
where
    I: Iterator<Item = String>,
{
    args.next().ok_or(CliError::MissingValue { flag })
}

fn parse_number<T>(value: &str, flag: &'static str) -> Result<T, CliError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse::<T>().map_err(|err| CliError::InvalidNumber {
        flag,
        value: value.to_owned(),
        message: err.to_string(),
    })
}

fn random_seed() -> u64 {
    rand::rng().random()
}

/// Errors surfaced by the CLI parsing and driver flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CliError {
    /// A flag expected a value but none was provided.
    #[error("missing value for {flag}")]
    MissingValue {
        /// Flag that was missing its value.
        flag: &'static str,
    },
    /// An unsupported argument was supplied.
    #[error("unknown argument: {value}")]
    UnknownArgument {
        /// Argument value that was not recognised.
        value: String,
    },
    /// A numeric value failed to parse.
    #[error("invalid number for {flag}: '{value}' ({message})")]
    InvalidNumber {
        /// Flag associated with the invalid number.
        flag: &'static str,
        /// Raw value supplied for the flag.
        value: String,
        /// Parser error message.
        message: String,
    },
    /// The endpoint URL failed to parse.
    #[error("invalid endpoint URL '{value}': {message}")]
    InvalidEndpoint {
        /// Raw endpoint value supplied.
        value: String,
        /// Parser error message.
        message: String,
    },
    /// The confirmation prompt could not be written or read.
    #[error("confirmation prompt failed: {message}")]
    Prompt {
        /// Description of the prompt failure.
        message: String,
    },
    /// An output file could not be written.
    #[error("output error: {source}")]
    Output {
        /// Underlying output error.
        #[from]
        #[source]
        source: OutputError,
    },
    /// The HTTP transport could not be constructed.
    #[error("transport error: {source}")]
    Transport {
        /// Underlying transport error.
        #[from]
        #[source]
        source: TransportError,
    },
}
