mod commands;
mod helpers;

use clap::Parser;
use cosmospec_core::domain::{EngineError, SpectrumError};
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let engine_error = error.as_engine_error();
            eprintln!("{}", engine_error.diagnostic_line());
            if let Some(summary_line) = engine_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            engine_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("cosmospec".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            init_logging(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

/// `--verbose` wins over `RUST_LOG`; otherwise only warnings reach stderr.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when `run` is driven more than once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "cosmospec",
    version,
    about = "Conservative spectral rebinning and transfer-function evolution"
)]
struct Cli {
    /// Emit debug-level diagnostics on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Print the centers, bin boundaries and log widths of a log-spaced grid
    Grid(commands::GridArgs),
    /// Discretize the power law `norm * E^power` onto a log-spaced grid
    Discretize(commands::DiscretizeArgs),
    /// Rebin per-bin counts at given energies onto a target grid
    Rebin(commands::RebinArgs),
    /// Evolve an initial spectrum through inline dense transfer functions
    Evolve(commands::EvolveArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Grid(args) => commands::run_grid_command(args),
        CliCommand::Discretize(args) => commands::run_discretize_command(args),
        CliCommand::Rebin(args) => commands::run_rebin_command(args),
        CliCommand::Evolve(args) => commands::run_evolve_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Request(String),
    #[error("{0}")]
    Compute(EngineError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SpectrumError> for CliError {
    fn from(error: SpectrumError) -> Self {
        Self::Compute(error.into())
    }
}

impl CliError {
    fn as_engine_error(&self) -> EngineError {
        match self {
            Self::Usage(message) => {
                EngineError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Request(message) => {
                EngineError::input_validation("INPUT.CLI_REQUEST", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => EngineError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
