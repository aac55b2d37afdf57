use super::InterpolationProvider;
use crate::domain::{SpectrumError, SpectrumResult};
use crate::spectrum::grid::validate_increasing;

/// Value reported outside the tabulated `log10 x` range (effectively zero).
pub const LOG10_FLOOR: f64 = -100.0;

/// `log10(dN/dlog10 x)` tabulated on a (mass, log10 x) grid with bilinear
/// interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedChannel {
    masses: Vec<f64>,
    log10_x: Vec<f64>,
    values: Vec<Vec<f64>>,
}

impl TabulatedChannel {
    /// `values[m][k]` belongs to `masses[m]` and `log10_x[k]`.
    pub fn new(masses: Vec<f64>, log10_x: Vec<f64>, values: Vec<Vec<f64>>) -> SpectrumResult<Self> {
        for (axis, len) in [("mass", masses.len()), ("log10 x", log10_x.len())] {
            if len < 2 {
                return Err(SpectrumError::InvalidArgument(format!(
                    "channel table needs at least 2 {axis} points, got {len}"
                )));
            }
        }
        validate_increasing("channel masses", &masses)?;
        validate_increasing("channel log10 x", &log10_x)?;
        if values.len() != masses.len() {
            return Err(SpectrumError::ShapeMismatch {
                context: "channel table rows",
                expected: masses.len(),
                actual: values.len(),
            });
        }
        if let Some(row) = values.iter().find(|row| row.len() != log10_x.len()) {
            return Err(SpectrumError::ShapeMismatch {
                context: "channel table columns",
                expected: log10_x.len(),
                actual: row.len(),
            });
        }
        Ok(Self {
            masses,
            log10_x,
            values,
        })
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn log10_x(&self) -> &[f64] {
        &self.log10_x
    }
}

/// Lower index and weight of the upper neighbour for `value` inside `axis`.
fn bracket(axis: &[f64], value: f64) -> (usize, f64) {
    let upper = axis
        .partition_point(|point| *point <= value)
        .clamp(1, axis.len() - 1);
    let lower = upper - 1;
    let weight = (value - axis[lower]) / (axis[upper] - axis[lower]);
    (lower, weight.clamp(0.0, 1.0))
}

impl InterpolationProvider for TabulatedChannel {
    fn mass_range(&self) -> (f64, f64) {
        (self.masses[0], self.masses[self.masses.len() - 1])
    }

    fn value(&self, mass: f64, log10_x: f64) -> SpectrumResult<f64> {
        self.check_mass(mass)?;

        let last = self.log10_x.len() - 1;
        if log10_x.is_nan() || log10_x <= self.log10_x[0] || log10_x >= self.log10_x[last] {
            return Ok(LOG10_FLOOR);
        }

        let (m, mass_weight) = bracket(&self.masses, mass);
        let (k, x_weight) = bracket(&self.log10_x, log10_x);
        let at_mass = |row: &[f64]| row[k] + x_weight * (row[k + 1] - row[k]);
        let low = at_mass(&self.values[m]);
        let high = at_mass(&self.values[m + 1]);
        Ok(low + mass_weight * (high - low))
    }
}
