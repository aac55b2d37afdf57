//! Annihilation/decay channel spectra feeding the initial injection.

pub mod combine;
pub mod injection;
pub mod table;

pub use combine::{ChannelSplit, CombinedChannel, Secondary, channel_split, combine_log10};
pub use injection::{discretize_injection, injection_dnde};
pub use table::{LOG10_FLOOR, TabulatedChannel};

use crate::domain::{SpectrumError, SpectrumResult};

/// Lookup of `log10(dN / dlog10 x)` for a dark-matter mass and
/// `log10 x = log10(E / mass)`.
pub trait InterpolationProvider {
    /// Inclusive range of tabulated masses.
    fn mass_range(&self) -> (f64, f64);

    /// Fails with [`SpectrumError::Domain`] outside [`Self::mass_range`].
    fn value(&self, mass: f64, log10_x: f64) -> SpectrumResult<f64>;

    fn check_mass(&self, mass: f64) -> SpectrumResult<()> {
        let (low, high) = self.mass_range();
        if mass.is_nan() || mass < low || mass > high {
            return Err(SpectrumError::Domain {
                parameter: "mass",
                value: mass,
                low,
                high,
            });
        }
        Ok(())
    }
}

impl<T: InterpolationProvider + ?Sized> InterpolationProvider for &T {
    fn mass_range(&self) -> (f64, f64) {
        (**self).mass_range()
    }

    fn value(&self, mass: f64, log10_x: f64) -> SpectrumResult<f64> {
        (**self).value(mass, log10_x)
    }
}
