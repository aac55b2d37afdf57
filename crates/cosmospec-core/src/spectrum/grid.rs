use crate::domain::{SpectrumError, SpectrumResult};
use crate::numerics::log_spaced;

/// Strictly increasing, positive energy abscissa with log-midpoint bin edges.
///
/// Immutable once built; share it between spectra through `Arc<EnergyGrid>`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyGrid {
    values: Vec<f64>,
    bin_boundaries: Vec<f64>,
}

impl EnergyGrid {
    pub fn new(values: Vec<f64>) -> SpectrumResult<Self> {
        validate_abscissa("energy grid", &values)?;
        let bin_boundaries = bin_boundaries(&values)?;
        Ok(Self {
            values,
            bin_boundaries,
        })
    }

    pub fn log_spaced(low: f64, high: f64, count: usize) -> SpectrumResult<Self> {
        if count < 2 {
            return Err(SpectrumError::InsufficientBins { actual: count });
        }
        let values = log_spaced(low, high, count).ok_or_else(|| {
            SpectrumError::InvalidArgument(format!(
                "log-spaced grid needs 0 < low < high, got low={low}, high={high}"
            ))
        })?;
        Self::new(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// `len() + 1` edges; see [`bin_boundaries`].
    pub fn bin_boundaries(&self) -> &[f64] {
        &self.bin_boundaries
    }

    pub fn log_bin_widths(&self) -> Vec<f64> {
        self.bin_boundaries
            .windows(2)
            .map(|edge| edge[1].ln() - edge[0].ln())
            .collect()
    }

    pub fn bin_widths(&self) -> Vec<f64> {
        self.bin_boundaries
            .windows(2)
            .map(|edge| edge[1] - edge[0])
            .collect()
    }

    /// `E * dlog E` per bin, the factor converting `dN/dE` into a count.
    pub fn number_weights(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(self.log_bin_widths())
            .map(|(energy, width)| energy * width)
            .collect()
    }

    /// Centers with one synthetic bin prepended, placed one log-gap below the
    /// first real center.
    pub fn extended_below(&self) -> Vec<f64> {
        let log_gap = self.values[1].ln() - self.values[0].ln();
        let mut extended = Vec::with_capacity(self.values.len() + 1);
        extended.push((self.values[0].ln() - log_gap).exp());
        extended.extend_from_slice(&self.values);
        extended
    }

    pub fn same_abscissa(&self, other: &EnergyGrid) -> bool {
        self.values == other.values
    }
}

/// Log-midpoint bin boundaries of an abscissa.
///
/// Interior edge `i` is `sqrt(values[i-1] * values[i])`. The outer edges
/// mirror the nearest log-gap, so the edge bins are as wide in log space as
/// their neighbouring gap.
pub fn bin_boundaries(values: &[f64]) -> SpectrumResult<Vec<f64>> {
    let count = values.len();
    if count < 2 {
        return Err(SpectrumError::InsufficientBins { actual: count });
    }

    let log_width_low = values[1].ln() - values[0].ln();
    let log_width_upp = values[count - 1].ln() - values[count - 2].ln();

    let mut boundaries = Vec::with_capacity(count + 1);
    boundaries.push((values[0].ln() - log_width_low / 2.0).exp());
    boundaries.extend(values.windows(2).map(|pair| (pair[0] * pair[1]).sqrt()));
    boundaries.push((values[count - 1].ln() + log_width_upp / 2.0).exp());
    Ok(boundaries)
}

pub(crate) fn validate_abscissa(context: &'static str, values: &[f64]) -> SpectrumResult<()> {
    if values.len() < 2 {
        return Err(SpectrumError::InsufficientBins {
            actual: values.len(),
        });
    }
    for (index, value) in values.iter().copied().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(SpectrumError::NonFiniteValue {
                context,
                index,
                value,
            });
        }
    }
    validate_increasing(context, values)
}

pub(crate) fn validate_increasing(context: &'static str, values: &[f64]) -> SpectrumResult<()> {
    match values.windows(2).position(|pair| pair[1] <= pair[0]) {
        Some(position) => Err(SpectrumError::UnorderedGrid {
            context,
            index: position + 1,
            previous: values[position],
            current: values[position + 1],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{EnergyGrid, bin_boundaries};
    use crate::domain::SpectrumError;
    use approx::assert_relative_eq;

    #[test]
    fn fewer_than_two_values_is_rejected() {
        assert_eq!(
            bin_boundaries(&[1.0]),
            Err(SpectrumError::InsufficientBins { actual: 1 })
        );
        assert_eq!(
            EnergyGrid::new(vec![]),
            Err(SpectrumError::InsufficientBins { actual: 0 })
        );
    }

    #[test]
    fn unordered_values_are_rejected() {
        let error = EnergyGrid::new(vec![1.0, 3.0, 2.0]).expect_err("unordered");
        assert!(matches!(
            error,
            SpectrumError::UnorderedGrid { index: 2, .. }
        ));
        let error = EnergyGrid::new(vec![1.0, 1.0]).expect_err("repeated");
        assert!(matches!(error, SpectrumError::UnorderedGrid { .. }));
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let error = EnergyGrid::new(vec![0.0, 1.0]).expect_err("zero");
        assert!(matches!(error, SpectrumError::NonFiniteValue { index: 0, .. }));
    }

    #[test]
    fn geometric_grid_boundaries_sit_at_half_log_steps() {
        let ratio: f64 = 3.0;
        let values: Vec<f64> = (0..6).map(|index| 2.0 * ratio.powi(index)).collect();
        let boundaries = bin_boundaries(&values).expect("boundaries");

        assert_eq!(boundaries.len(), values.len() + 1);
        for (index, value) in values.iter().enumerate() {
            assert_relative_eq!(boundaries[index], value / ratio.sqrt(), max_relative = 1.0e-12);
        }
        assert_relative_eq!(
            boundaries[6],
            values[5] * ratio.sqrt(),
            max_relative = 1.0e-12
        );
        assert_relative_eq!(
            boundaries[0] * boundaries[1],
            values[0] * values[0],
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn edge_bins_mirror_neighbouring_log_gap() {
        let grid = EnergyGrid::new(vec![1.0, 2.0, 8.0]).expect("grid");
        let widths = grid.log_bin_widths();
        assert_relative_eq!(widths[0], 2.0_f64.ln(), max_relative = 1.0e-12);
        assert_relative_eq!(widths[2], 4.0_f64.ln(), max_relative = 1.0e-12);
        assert_relative_eq!(widths[1], 0.5 * 2.0_f64.ln() + 0.5 * 4.0_f64.ln(), max_relative = 1.0e-12);
    }

    #[test]
    fn extended_grid_prepends_one_log_gap() {
        let grid = EnergyGrid::new(vec![1.0, 2.0, 4.0]).expect("grid");
        let extended = grid.extended_below();
        assert_eq!(extended.len(), 4);
        assert_relative_eq!(extended[0], 0.5, max_relative = 1.0e-12);
        assert_eq!(&extended[1..], grid.values());
    }

    #[test]
    fn log_spaced_constructor_validates_inputs() {
        let grid = EnergyGrid::log_spaced(1.0, 1.0e4, 5).expect("grid");
        assert_eq!(grid.len(), 5);
        assert_relative_eq!(grid.values()[2], 100.0, max_relative = 1.0e-12);
        assert!(matches!(
            EnergyGrid::log_spaced(1.0, 10.0, 1),
            Err(SpectrumError::InsufficientBins { actual: 1 })
        ));
        assert!(matches!(
            EnergyGrid::log_spaced(-1.0, 10.0, 4),
            Err(SpectrumError::InvalidArgument(_))
        ));
    }
}
