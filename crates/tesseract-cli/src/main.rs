//! tesseract - token ring over an n-dimensional hypercube
//!
//! Usage:
//!   tesseract <n>
//!
//! Spawns one worker per vertex of the n-cube, circulates a single token at
//! random and logs every arrival to `./<n>/<binary id>.txt`.
//!
//! Signals:
//!   SIGUSR1  suspend every worker, or resume them if suspended
//!   SIGINT   interrupt every worker and exit once all are reaped

use std::process::ExitCode;

use tesseract_ring::{Error, RingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_usage() {
    eprintln!("tesseract - token ring over an n-dimensional hypercube");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  tesseract <n>       Run 2^n workers and log arrivals under ./<n>/");
    eprintln!();
    eprintln!("Signals:");
    eprintln!("  SIGUSR1             Toggle pause/resume of every worker");
    eprintln!("  SIGINT              Interrupt every worker and exit");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG            Log filter (default: tesseract=info,tesseract_ring=info)");
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(u32),
    Help,
}

fn parse_args(args: &[String]) -> Result<Command, Error> {
    match args {
        [arg] if arg == "-h" || arg == "--help" => Ok(Command::Help),
        [arg] => arg.parse::<u32>().map(Command::Run).map_err(|_| {
            Error::Usage(format!("dimension must be a non-negative integer, got {arg:?}"))
        }),
        _ => Err(Error::Usage("expected exactly one argument <n>".into())),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tesseract=info,tesseract_ring=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let dimension = match parse_args(&args) {
        Ok(Command::Run(n)) => n,
        Ok(Command::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("tesseract: {e}");
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(pid = std::process::id(), dimension, "starting tesseract");

    match tesseract_ring::run(RingConfig::new(dimension)).await {
        Ok(report) => {
            if !report.is_clean() {
                tracing::warn!(failed = report.failed.len(), "some workers failed");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("tesseract: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_dimension() {
        assert_eq!(parse_args(&args(&["3"])).unwrap(), Command::Run(3));
        assert_eq!(parse_args(&args(&["0"])).unwrap(), Command::Run(0));
    }

    #[test]
    fn help_flag() {
        assert_eq!(parse_args(&args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(parse_args(&args(&["-h"])).unwrap(), Command::Help);
    }

    #[test]
    fn usage_errors() {
        assert!(matches!(parse_args(&args(&[])), Err(Error::Usage(_))));
        assert!(matches!(parse_args(&args(&["-1"])), Err(Error::Usage(_))));
        assert!(matches!(parse_args(&args(&["two"])), Err(Error::Usage(_))));
        assert!(matches!(parse_args(&args(&["2", "3"])), Err(Error::Usage(_))));
    }
}
