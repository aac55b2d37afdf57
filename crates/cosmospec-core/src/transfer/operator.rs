use crate::domain::SpectrumResult;
use crate::spectrum::{EnergyGrid, Spectrum};
use std::sync::Arc;

/// A linear map advancing a spectrum across one redshift step.
///
/// Implementations may produce spectra on a different grid than they accept.
/// The returned spectrum keeps the input's epoch; the caller stamps the
/// redshift reached after the step.
pub trait TransferOperator {
    /// Grid the operator expects its input spectrum on.
    fn in_grid(&self) -> &Arc<EnergyGrid>;

    /// Redshift at which the step starts.
    fn redshift(&self) -> f64;

    /// Width of the step in `ln(1 + z)`.
    fn dlnz(&self) -> f64;

    fn apply(&self, spectrum: &Spectrum) -> SpectrumResult<Spectrum>;
}

impl<T: TransferOperator + ?Sized> TransferOperator for Box<T> {
    fn in_grid(&self) -> &Arc<EnergyGrid> {
        (**self).in_grid()
    }

    fn redshift(&self) -> f64 {
        (**self).redshift()
    }

    fn dlnz(&self) -> f64 {
        (**self).dlnz()
    }

    fn apply(&self, spectrum: &Spectrum) -> SpectrumResult<Spectrum> {
        (**self).apply(spectrum)
    }
}
