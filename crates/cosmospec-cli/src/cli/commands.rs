use super::CliError;
use super::helpers::{print_json, read_json_request};
use cosmospec_core::common::{EngineConfig, load_engine_config};
use cosmospec_core::evolve::{EvolutionMode, EvolutionOutcome, evolve};
use cosmospec_core::serialization::{SpectrumReport, history_reports};
use cosmospec_core::spectrum::{EnergyGrid, Spectrum, discretize, rebin};
use cosmospec_core::transfer::{DenseTransferFunction, TransferOperatorSequence};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, clap::Args)]
pub(super) struct GridArgs {
    /// Lowest bin-center energy
    #[arg(long)]
    low: f64,

    /// Highest bin-center energy
    #[arg(long)]
    high: f64,

    /// Number of bin centers
    #[arg(long)]
    count: usize,
}

impl GridArgs {
    fn build(&self) -> Result<EnergyGrid, CliError> {
        Ok(EnergyGrid::log_spaced(self.low, self.high, self.count)?)
    }
}

#[derive(Debug, clap::Args)]
pub(super) struct DiscretizeArgs {
    #[command(flatten)]
    grid: GridArgs,

    /// Power-law index of dN/dE
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    power: f64,

    /// Normalization of dN/dE at E = 1
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    norm: f64,

    /// Engine configuration JSON (integration tolerances)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub(super) struct RebinArgs {
    /// JSON request: { "counts": [...], "inEng": [...], "outEng": [...] }
    #[arg(value_name = "REQUEST")]
    request: PathBuf,
}

#[derive(Debug, clap::Args)]
pub(super) struct EvolveArgs {
    /// JSON request holding the grid, initial counts and operators
    #[arg(value_name = "REQUEST")]
    request: PathBuf,

    /// Stop before the first operator at or below this redshift
    #[arg(long, allow_negative_numbers = true)]
    end_redshift: Option<f64>,

    /// Print every intermediate spectrum instead of only the final one
    #[arg(long)]
    record: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GridReport {
    centers: Vec<f64>,
    boundaries: Vec<f64>,
    log_bin_widths: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RebinRequest {
    counts: Vec<f64>,
    in_eng: Vec<f64>,
    out_eng: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct EvolveRequest {
    grid: Vec<f64>,
    counts: Vec<f64>,
    /// Epoch of the initial spectrum; defaults to the first operator's redshift.
    #[serde(default)]
    redshift: Option<f64>,
    operators: Vec<OperatorRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct OperatorRequest {
    redshift: f64,
    matrix: Vec<Vec<f64>>,
    #[serde(default)]
    dlnz: f64,
}

pub(super) fn run_grid_command(args: GridArgs) -> Result<i32, CliError> {
    let grid = args.build()?;
    print_json(&GridReport {
        centers: grid.values().to_vec(),
        boundaries: grid.bin_boundaries().to_vec(),
        log_bin_widths: grid.log_bin_widths(),
    })?;
    Ok(0)
}

pub(super) fn run_discretize_command(args: DiscretizeArgs) -> Result<i32, CliError> {
    let config = match &args.config {
        Some(path) => load_engine_config(path).map_err(anyhow::Error::new)?,
        None => EngineConfig::default(),
    };
    let grid = Arc::new(args.grid.build()?);
    let (norm, power) = (args.norm, args.power);
    debug!(norm, power, bins = grid.len(), "discretizing power law");

    let spectrum = discretize(|eng| norm * eng.powf(power), grid, config.integration)?;
    print_json(&SpectrumReport::from(&spectrum))?;
    Ok(0)
}

pub(super) fn run_rebin_command(args: RebinArgs) -> Result<i32, CliError> {
    let request: RebinRequest = read_json_request(&args.request)?;
    let out_grid = Arc::new(EnergyGrid::new(request.out_eng)?);

    let spectrum = rebin(&request.counts, &request.in_eng, out_grid)?;
    print_json(&SpectrumReport::from(&spectrum))?;
    Ok(0)
}

pub(super) fn run_evolve_command(args: EvolveArgs) -> Result<i32, CliError> {
    let request: EvolveRequest = read_json_request(&args.request)?;
    if request.operators.is_empty() {
        return Err(CliError::Request(format!(
            "evolve request '{}' lists no operators",
            args.request.display()
        )));
    }

    let grid = Arc::new(EnergyGrid::new(request.grid)?);
    let operators = request
        .operators
        .iter()
        .map(|operator| {
            DenseTransferFunction::from_rows(
                grid.clone(),
                grid.clone(),
                &operator.matrix,
                operator.redshift,
                operator.dlnz,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    let sequence = TransferOperatorSequence::new(operators)?;

    let mut initial = Spectrum::from_number(grid, &request.counts)?;
    if let Some(epoch) = request
        .redshift
        .or_else(|| sequence.redshifts().first().copied())
    {
        initial.epoch = epoch;
    }

    let mode = if args.record {
        EvolutionMode::Recording
    } else {
        EvolutionMode::Collapsed
    };
    debug!(
        operators = sequence.len(),
        end_redshift = ?args.end_redshift,
        ?mode,
        "loaded evolution request"
    );

    match evolve(initial, &sequence, args.end_redshift, mode)? {
        EvolutionOutcome::Final(spectrum) => print_json(&SpectrumReport::from(&spectrum))?,
        EvolutionOutcome::History(history) => print_json(&history_reports(&history))?,
    }
    Ok(0)
}
