use super::density::{Spectrum, UNSET_EPOCH, Underflow};
use super::grid::{EnergyGrid, validate_increasing};
use crate::domain::{SpectrumError, SpectrumResult};
use crate::numerics::{BinPosition, IntegrationTolerance, fractional_index, integrate_adaptive};
use std::sync::Arc;
use tracing::debug;

/// Rebins particle counts with known energies onto `out_grid`.
///
/// `number[i]` particles each carry energy `in_eng[i]`; `in_eng` need not be
/// ordered. Every particle is split between the two output centers that
/// bracket it, with weights linear in energy, so counts are conserved exactly
/// and energy up to the clamped top bin. Particles below the lowest output
/// center partly land in the lowest bin; whatever falls further below one
/// log-gap under it is reported through [`Spectrum::underflow`].
///
/// Fails with [`SpectrumError::OverflowNotSupported`] when the last input
/// energy exceeds the top of `out_grid`, and with [`SpectrumError::Overflow`]
/// when any other input energy does.
pub fn rebin(number: &[f64], in_eng: &[f64], out_grid: Arc<EnergyGrid>) -> SpectrumResult<Spectrum> {
    if number.len() != in_eng.len() {
        return Err(SpectrumError::ShapeMismatch {
            context: "rebin input",
            expected: in_eng.len(),
            actual: number.len(),
        });
    }
    validate_increasing("rebin target", out_grid.values())?;
    ensure_finite("rebin energies", in_eng)?;
    ensure_finite("rebin counts", number)?;
    if let Some(&input_top) = in_eng.last() {
        if out_grid.last() < input_top {
            return Err(SpectrumError::OverflowNotSupported {
                target_top: out_grid.last(),
                input_top,
            });
        }
    }

    let extended = out_grid.extended_below();
    let top_index = out_grid.len() - 1;
    let number_weights = out_grid.number_weights();
    let lowest_center = out_grid.first();

    let mut counts = vec![0.0; out_grid.len()];
    let mut below_number = 0.0;
    let mut below_energy = 0.0;
    let mut above_underflow = 0.0;

    for (&particles, &energy) in number.iter().zip(in_eng) {
        let position = match fractional_index(energy, &extended) {
            BinPosition::Above => return Err(SpectrumError::Overflow { energy }),
            BinPosition::Below => {
                below_number += particles;
                below_energy += particles * energy;
                continue;
            }
            // Shift so the synthetic bin sits at -1 and real bins start at 0.
            BinPosition::At(index) => index - 1.0,
        };

        if position < 0.0 {
            let overlap = position + 1.0;
            below_number += particles;
            below_energy += particles * energy;
            above_underflow += overlap * particles;
            continue;
        }

        // A particle exactly on the top center takes the topmost split.
        let lower = (position.floor() as usize).min(top_index - 1);
        let upper = lower + 1;
        let upper_share = position - lower as f64;
        counts[lower] += (1.0 - upper_share) * particles;
        counts[upper] += upper_share * particles;
    }

    counts[0] += above_underflow;
    let underflow = Underflow {
        number: below_number - above_underflow,
        energy: below_energy - above_underflow * lowest_center,
    };
    if !underflow.is_empty() {
        debug!(
            number = underflow.number,
            energy = underflow.energy,
            lowest_center,
            "rebinning pushed particles below the target grid"
        );
    }

    let density = counts
        .iter()
        .zip(&number_weights)
        .map(|(count, weight)| count / weight)
        .collect();
    let mut spectrum = Spectrum::new(out_grid, density, UNSET_EPOCH)?;
    spectrum.underflow = underflow;
    Ok(spectrum)
}

fn ensure_finite(context: &'static str, values: &[f64]) -> SpectrumResult<()> {
    match values.iter().position(|value| !value.is_finite()) {
        Some(index) => Err(SpectrumError::NonFiniteValue {
            context,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

/// Discretizes a continuous `dN/dE` onto `grid`.
///
/// The grid values serve both as integration bounds and as the output bin
/// centers: each interval `[grid[i], grid[i+1]]` contributes its integrated
/// count at its mean energy, then the counts are rebinned onto `grid` so both
/// integrals are conserved. The result's epoch is unset.
pub fn discretize<F>(
    dnde: F,
    grid: Arc<EnergyGrid>,
    tolerance: IntegrationTolerance,
) -> SpectrumResult<Spectrum>
where
    F: Fn(f64) -> f64,
{
    let values = grid.values();
    let mut number = vec![0.0; values.len()];
    let mut mean_energy = vec![0.0; values.len()];

    for (index, bounds) in values.windows(2).enumerate() {
        let (low, upp) = (bounds[0], bounds[1]);
        number[index] = integrate_adaptive(&dnde, low, upp, tolerance)?;
        if number[index] > 0.0 {
            let energy = integrate_adaptive(|eng| eng * dnde(eng), low, upp, tolerance)?;
            mean_energy[index] = energy / number[index];
        }
    }

    rebin(&number, &mean_energy, grid)
}

pub fn discretize_default<F>(dnde: F, grid: Arc<EnergyGrid>) -> SpectrumResult<Spectrum>
where
    F: Fn(f64) -> f64,
{
    discretize(dnde, grid, IntegrationTolerance::default())
}
