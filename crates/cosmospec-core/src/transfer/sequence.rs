use super::dense::DenseTransferFunction;
use super::operator::TransferOperator;
use crate::domain::{SpectrumError, SpectrumResult};
use crate::spectrum::EnergyGrid;
use faer::Mat;
use std::sync::Arc;
use tracing::debug;

/// Transfer operators ordered by strictly decreasing redshift, all accepting
/// spectra on the same input grid and spanning the same `dlnz` step.
#[derive(Debug, Clone)]
pub struct TransferOperatorSequence<Op> {
    in_grid: Arc<EnergyGrid>,
    redshifts: Vec<f64>,
    operators: Vec<Op>,
}

impl<Op: TransferOperator> TransferOperatorSequence<Op> {
    pub fn new(operators: Vec<Op>) -> SpectrumResult<Self> {
        let Some(first) = operators.first() else {
            return Err(SpectrumError::InvalidArgument(
                "a transfer operator sequence needs at least one operator".to_string(),
            ));
        };
        let in_grid = first.in_grid().clone();

        if operators
            .iter()
            .any(|operator| !operator.in_grid().same_abscissa(&in_grid))
        {
            return Err(SpectrumError::AbscissaMismatch {
                context: "transfer operator sequence",
            });
        }

        let dlnz = first.dlnz();
        if let Some((index, operator)) = operators
            .iter()
            .enumerate()
            .find(|(_, operator)| !same_step(operator.dlnz(), dlnz))
        {
            return Err(SpectrumError::NonUniformStep {
                index,
                expected: dlnz,
                actual: operator.dlnz(),
            });
        }

        let redshifts: Vec<f64> = operators.iter().map(TransferOperator::redshift).collect();
        if let Some(position) = redshifts.windows(2).position(|pair| pair[1] >= pair[0]) {
            return Err(SpectrumError::UnorderedRedshift {
                index: position + 1,
                previous: redshifts[position],
                current: redshifts[position + 1],
            });
        }

        Ok(Self {
            in_grid,
            redshifts,
            operators,
        })
    }

    pub fn in_grid(&self) -> &Arc<EnergyGrid> {
        &self.in_grid
    }

    /// Step width shared by every operator.
    pub fn dlnz(&self) -> f64 {
        self.operators[0].dlnz()
    }

    pub fn redshifts(&self) -> &[f64] {
        &self.redshifts
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Op> {
        self.operators.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Op> {
        self.operators.iter()
    }

    /// Index of the last operator whose redshift is still strictly above
    /// `end_redshift`, or the last index when no target is given.
    ///
    /// Evolution applies operators `0..stopping_index`, so the result is also
    /// the number of steps taken. A target at or above the first redshift
    /// yields zero steps.
    pub fn stopping_index(&self, end_redshift: Option<f64>) -> usize {
        match end_redshift {
            Some(target) => self
                .redshifts
                .iter()
                .rposition(|redshift| *redshift > target)
                .unwrap_or(0),
            None => self.redshifts.len() - 1,
        }
    }
}

impl TransferOperatorSequence<DenseTransferFunction> {
    /// Trades redshift resolution for fewer steps.
    ///
    /// Each kept operator becomes its `factor`-fold self-composition. With
    /// `keep_every` only every `factor`-th operator is kept, so the redshift
    /// abscissa stays consistent with the coarser step.
    pub fn coarsen(&self, factor: usize, keep_every: bool) -> SpectrumResult<Self> {
        if factor == 0 {
            return Err(SpectrumError::InvalidArgument(
                "coarsening factor must be at least 1".to_string(),
            ));
        }

        let step = if keep_every { factor } else { 1 };
        let operators = self
            .operators
            .iter()
            .step_by(step)
            .map(|operator| operator.power(factor))
            .collect::<SpectrumResult<Vec<_>>>()?;

        debug!(
            factor,
            keep_every,
            before = self.operators.len(),
            after = operators.len(),
            "coarsened transfer operator sequence"
        );
        Self::new(operators)
    }

    /// Resamples the sequence onto `redshifts`.
    ///
    /// Each new operator is the entry-wise linear interpolation in redshift
    /// between the two tabulated operators bracketing it, and keeps the
    /// common `dlnz`. Targets must lie within the tabulated range and
    /// strictly decrease.
    pub fn at_redshifts(&self, redshifts: &[f64]) -> SpectrumResult<Self> {
        let operators = redshifts
            .iter()
            .map(|redshift| self.interpolate_at(*redshift))
            .collect::<SpectrumResult<Vec<_>>>()?;
        debug!(
            before = self.operators.len(),
            after = operators.len(),
            "resampled transfer operator sequence"
        );
        Self::new(operators)
    }

    fn interpolate_at(&self, redshift: f64) -> SpectrumResult<DenseTransferFunction> {
        let high = self.redshifts[0];
        let low = self.redshifts[self.redshifts.len() - 1];
        if !(redshift >= low && redshift <= high) {
            return Err(SpectrumError::Domain {
                parameter: "redshift",
                value: redshift,
                low,
                high,
            });
        }

        let upper = self
            .redshifts
            .iter()
            .rposition(|tabulated| *tabulated >= redshift)
            .unwrap_or(0);
        let above = &self.operators[upper];
        let below = match self.operators.get(upper + 1) {
            Some(below) if self.redshifts[upper] != redshift => below,
            _ => {
                return DenseTransferFunction::new(
                    above.in_grid().clone(),
                    above.out_grid().clone(),
                    above.matrix().clone(),
                    redshift,
                    above.dlnz(),
                );
            }
        };
        if !above.out_grid().same_abscissa(below.out_grid()) {
            return Err(SpectrumError::AbscissaMismatch {
                context: "transfer function interpolation",
            });
        }

        let weight = (self.redshifts[upper] - redshift) / (self.redshifts[upper] - below.redshift());
        let (upper_matrix, lower_matrix) = (above.matrix(), below.matrix());
        let matrix = Mat::from_fn(upper_matrix.nrows(), upper_matrix.ncols(), |row, col| {
            let start = upper_matrix[(row, col)];
            start + weight * (lower_matrix[(row, col)] - start)
        });
        DenseTransferFunction::new(
            above.in_grid().clone(),
            above.out_grid().clone(),
            matrix,
            redshift,
            above.dlnz(),
        )
    }
}

fn same_step(lhs: f64, rhs: f64) -> bool {
    (lhs - rhs).abs() <= 1.0e-9 * lhs.abs().max(rhs.abs())
}

impl<'a, Op> IntoIterator for &'a TransferOperatorSequence<Op> {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.operators.iter()
    }
}
