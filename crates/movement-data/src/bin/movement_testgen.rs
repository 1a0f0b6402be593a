//! Command-line entry point for generating and replaying movement datasets.

use std::io::{self, Write};
use std::process::ExitCode;

use movement_data::testgen_cli::{ParseOutcome, StdinConfirmation, parse_args, run};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    if let Err(error) = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
    {
        warn!(%error, "failed to initialise tracing subscriber");
    }

    execute()
}

fn execute() -> ExitCode {
    let outcome = match parse_args(std::env::args().skip(1)) {
        Ok(outcome) => outcome,
        Err(error) => {
            report_error(&error.to_string());
            return ExitCode::FAILURE;
        }
    };

    let options = match outcome {
        ParseOutcome::Help => {
            print_usage(io::stdout().lock());
            return ExitCode::SUCCESS;
        }
        ParseOutcome::Options(options) => options,
    };

    let mut gate = StdinConfirmation;
    let mut out = io::stdout().lock();
    match run(&options, &mut gate, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            drop(out);
            report_error(&error.to_string());
            ExitCode::FAILURE
        }
    }
}

fn report_error(message: &str) {
    if let Err(error) = writeln!(io::stderr(), "error: {message}") {
        drop(error);
    }
}

fn print_usage(mut out: impl Write) {
    let usage = concat!(
        "Usage: movement-testgen [OPTIONS]\n",
        "\n",
        "Generates a synthetic movement dataset, writes it to disk, and\n",
        "optionally replays it against a movement ingestion API.\n",
        "\n",
        "Options:\n",
        "  --endpoint <URL>       API base URL (default http://localhost:5001)\n",
        "  --seed <N>             RNG seed; random when omitted\n",
        "  --normal-count <N>     Routine movements to generate (default 1000)\n",
        "  --transfer-runs <N>    Device transfer runs to generate (default 10)\n",
        "  --delay-ms <N>         Pause between replay requests (default 100)\n",
        "  --output <PATH>        Dataset file (default test_movements.json)\n",
        "  --results <PATH>       Replay results file (default test_results.json)\n",
        "  --yes                  Replay without asking for confirmation\n",
        "  -h, --help             Show this help\n",
    );
    if let Err(error) = out.write_all(usage.as_bytes()) {
        drop(error);
    }
}
