use super::InterpolationProvider;
use crate::domain::{SpectrumError, SpectrumResult};
use crate::numerics::IntegrationTolerance;
use crate::spectrum::{EnergyGrid, Spectrum, discretize};
use std::cell::RefCell;
use std::f64::consts::LN_10;
use std::sync::Arc;

/// Continuous `dN/dE` of secondaries with energy `energy` from a primary of
/// mass `mass`, with `x = energy / mass`.
pub fn injection_dnde<P: InterpolationProvider>(
    provider: &P,
    mass: f64,
    energy: f64,
) -> SpectrumResult<f64> {
    if energy <= 0.0 {
        return Ok(0.0);
    }
    let log10_x = (energy / mass).log10();
    let dn_dlog10x = 10.0_f64.powf(provider.value(mass, log10_x)?);
    Ok(dn_dlog10x / (energy * LN_10))
}

/// Discretizes the injection spectrum of `provider` at `mass` onto `grid`.
///
/// The first lookup failure aborts the whole discretization.
pub fn discretize_injection<P: InterpolationProvider>(
    provider: &P,
    mass: f64,
    grid: Arc<EnergyGrid>,
    tolerance: IntegrationTolerance,
) -> SpectrumResult<Spectrum> {
    provider.check_mass(mass)?;

    let failure: RefCell<Option<SpectrumError>> = RefCell::new(None);
    let spectrum = discretize(
        |energy| match injection_dnde(provider, mass, energy) {
            Ok(value) => value,
            Err(error) => {
                failure.borrow_mut().get_or_insert(error);
                0.0
            }
        },
        grid,
        tolerance,
    );

    match failure.into_inner() {
        Some(error) => Err(error),
        None => spectrum,
    }
}
