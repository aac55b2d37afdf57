use super::operator::TransferOperator;
use crate::domain::{SpectrumError, SpectrumResult};
use crate::numerics::stable_sum_iter;
use crate::spectrum::{EnergyGrid, Spectrum};
use faer::Mat;
use std::sync::Arc;

/// Transfer function tabulated at one redshift.
///
/// Row `i` of `matrix` is the output `dN/dE` (on `out_grid`) produced per
/// particle injected in input bin `i`.
#[derive(Debug, Clone)]
pub struct DenseTransferFunction {
    in_grid: Arc<EnergyGrid>,
    out_grid: Arc<EnergyGrid>,
    redshift: f64,
    dlnz: f64,
    matrix: Mat<f64>,
}

impl DenseTransferFunction {
    pub fn new(
        in_grid: Arc<EnergyGrid>,
        out_grid: Arc<EnergyGrid>,
        matrix: Mat<f64>,
        redshift: f64,
        dlnz: f64,
    ) -> SpectrumResult<Self> {
        if matrix.nrows() != in_grid.len() {
            return Err(SpectrumError::ShapeMismatch {
                context: "transfer matrix rows",
                expected: in_grid.len(),
                actual: matrix.nrows(),
            });
        }
        if matrix.ncols() != out_grid.len() {
            return Err(SpectrumError::ShapeMismatch {
                context: "transfer matrix columns",
                expected: out_grid.len(),
                actual: matrix.ncols(),
            });
        }
        if !redshift.is_finite() {
            return Err(SpectrumError::InvalidArgument(format!(
                "transfer function redshift must be finite, got {redshift}"
            )));
        }
        Ok(Self {
            in_grid,
            out_grid,
            redshift,
            dlnz,
            matrix,
        })
    }

    pub fn from_rows(
        in_grid: Arc<EnergyGrid>,
        out_grid: Arc<EnergyGrid>,
        rows: &[Vec<f64>],
        redshift: f64,
        dlnz: f64,
    ) -> SpectrumResult<Self> {
        if rows.len() != in_grid.len() {
            return Err(SpectrumError::ShapeMismatch {
                context: "transfer matrix rows",
                expected: in_grid.len(),
                actual: rows.len(),
            });
        }
        if let Some(row) = rows.iter().find(|row| row.len() != out_grid.len()) {
            return Err(SpectrumError::ShapeMismatch {
                context: "transfer matrix columns",
                expected: out_grid.len(),
                actual: row.len(),
            });
        }
        let matrix = Mat::from_fn(rows.len(), out_grid.len(), |row, col| rows[row][col]);
        Self::new(in_grid, out_grid, matrix, redshift, dlnz)
    }

    /// Leaves every particle in the bin it was injected in.
    pub fn identity(grid: Arc<EnergyGrid>, redshift: f64, dlnz: f64) -> SpectrumResult<Self> {
        let weights = grid.number_weights();
        let matrix = Mat::from_fn(grid.len(), grid.len(), |row, col| {
            if row == col { 1.0 / weights[row] } else { 0.0 }
        });
        Self::new(grid.clone(), grid, matrix, redshift, dlnz)
    }

    pub fn out_grid(&self) -> &Arc<EnergyGrid> {
        &self.out_grid
    }

    pub fn matrix(&self) -> &Mat<f64> {
        &self.matrix
    }

    pub fn is_square(&self) -> bool {
        self.in_grid.same_abscissa(&self.out_grid)
    }

    /// The single operator equivalent to applying `self` and then `next`.
    ///
    /// The result keeps `self`'s redshift and the summed `dlnz`.
    pub fn compose(&self, next: &DenseTransferFunction) -> SpectrumResult<Self> {
        if !self.out_grid.same_abscissa(&next.in_grid) {
            return Err(SpectrumError::AbscissaMismatch {
                context: "transfer function composition",
            });
        }

        let weights = self.out_grid.number_weights();
        let rows = self.matrix.nrows();
        let inner = self.matrix.ncols();
        let cols = next.matrix.ncols();
        let mut product = Mat::<f64>::zeros(rows, cols);
        for row in 0..rows {
            for mid in 0..inner {
                let factor = self.matrix[(row, mid)] * weights[mid];
                if factor == 0.0 {
                    continue;
                }
                for col in 0..cols {
                    product[(row, col)] += factor * next.matrix[(mid, col)];
                }
            }
        }

        Self::new(
            self.in_grid.clone(),
            next.out_grid.clone(),
            product,
            self.redshift,
            self.dlnz + next.dlnz,
        )
    }

    /// `factor`-fold self-composition of a square transfer function.
    pub fn power(&self, factor: usize) -> SpectrumResult<Self> {
        if factor == 0 {
            return Err(SpectrumError::InvalidArgument(
                "transfer function power must be at least 1".to_string(),
            ));
        }
        if !self.is_square() {
            return Err(SpectrumError::AbscissaMismatch {
                context: "transfer function power",
            });
        }
        let mut result = self.clone();
        for _ in 1..factor {
            result = result.compose(self)?;
        }
        Ok(result)
    }
}

impl TransferOperator for DenseTransferFunction {
    fn in_grid(&self) -> &Arc<EnergyGrid> {
        &self.in_grid
    }

    fn redshift(&self) -> f64 {
        self.redshift
    }

    fn dlnz(&self) -> f64 {
        self.dlnz
    }

    fn apply(&self, spectrum: &Spectrum) -> SpectrumResult<Spectrum> {
        if !spectrum.grid().same_abscissa(&self.in_grid) {
            return Err(SpectrumError::AbscissaMismatch {
                context: "transfer function input",
            });
        }

        let number = spectrum.number_per_bin();
        let density = (0..self.matrix.ncols())
            .map(|col| {
                stable_sum_iter(
                    number
                        .iter()
                        .enumerate()
                        .map(|(row, count)| count * self.matrix[(row, col)]),
                )
            })
            .collect();

        let mut output = Spectrum::new(self.out_grid.clone(), density, spectrum.epoch)?;
        output.underflow = spectrum.underflow;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::DenseTransferFunction;
    use crate::domain::SpectrumError;
    use crate::spectrum::{EnergyGrid, Spectrum, Underflow};
    use crate::transfer::TransferOperator;
    use approx::assert_relative_eq;
    use faer::Mat;
    use std::sync::Arc;

    fn grid(values: &[f64]) -> Arc<EnergyGrid> {
        Arc::new(EnergyGrid::new(values.to_vec()).expect("grid"))
    }

    /// Moves every particle one bin down, keeping the lowest bin in place.
    fn downshift(grid: &Arc<EnergyGrid>, redshift: f64) -> DenseTransferFunction {
        let weights = grid.number_weights();
        let rows: Vec<Vec<f64>> = (0..grid.len())
            .map(|row| {
                let target = row.saturating_sub(1);
                (0..grid.len())
                    .map(|col| if col == target { 1.0 / weights[col] } else { 0.0 })
                    .collect()
            })
            .collect();
        DenseTransferFunction::from_rows(grid.clone(), grid.clone(), &rows, redshift, 0.1)
            .expect("downshift")
    }

    #[test]
    fn matrix_shape_is_validated() {
        let shared = grid(&[1.0, 2.0, 4.0]);
        let error = DenseTransferFunction::new(
            shared.clone(),
            shared.clone(),
            Mat::<f64>::zeros(2, 3),
            10.0,
            0.1,
        )
        .expect_err("rows");
        assert!(matches!(error, SpectrumError::ShapeMismatch { expected: 3, actual: 2, .. }));

        let error = DenseTransferFunction::from_rows(
            shared.clone(),
            shared,
            &[vec![0.0; 3], vec![0.0; 2], vec![0.0; 3]],
            10.0,
            0.1,
        )
        .expect_err("cols");
        assert!(matches!(error, SpectrumError::ShapeMismatch { actual: 2, .. }));
    }

    #[test]
    fn identity_preserves_spectrum_and_underflow() {
        let shared = grid(&[1.0, 2.0, 4.0, 8.0]);
        let mut spectrum = Spectrum::from_number(shared.clone(), &[1.0, 2.0, 3.0, 4.0]).expect("spec");
        spectrum.epoch = 50.0;
        spectrum.underflow = Underflow {
            number: 0.25,
            energy: 0.1,
        };

        let output = DenseTransferFunction::identity(shared, 50.0, 0.1)
            .expect("identity")
            .apply(&spectrum)
            .expect("apply");
        for (actual, expected) in output.density().iter().zip(spectrum.density()) {
            assert_relative_eq!(*actual, *expected, max_relative = 1.0e-12);
        }
        assert_eq!(output.epoch, 50.0);
        assert_eq!(output.underflow, spectrum.underflow);
    }

    #[test]
    fn apply_rejects_foreign_abscissa() {
        let operator = DenseTransferFunction::identity(grid(&[1.0, 2.0]), 5.0, 0.1).expect("op");
        let spectrum = Spectrum::from_number(grid(&[1.0, 3.0]), &[1.0, 1.0]).expect("spec");
        assert_eq!(
            operator.apply(&spectrum),
            Err(SpectrumError::AbscissaMismatch {
                context: "transfer function input"
            })
        );
    }

    #[test]
    fn apply_weights_rows_by_particle_count() {
        let shared = grid(&[1.0, 2.0, 4.0]);
        let operator = downshift(&shared, 10.0);
        let spectrum = Spectrum::from_number(shared, &[1.0, 2.0, 3.0]).expect("spec");

        let number = operator.apply(&spectrum).expect("apply").number_per_bin();
        assert_relative_eq!(number[0], 3.0, max_relative = 1.0e-12);
        assert_relative_eq!(number[1], 3.0, max_relative = 1.0e-12);
        assert_eq!(number[2], 0.0);
    }

    #[test]
    fn composition_matches_sequential_application() {
        let shared = grid(&[1.0, 2.0, 4.0, 8.0]);
        let first = downshift(&shared, 10.0);
        let second = downshift(&shared, 9.0);
        let spectrum = Spectrum::from_number(shared, &[0.5, 1.0, 2.0, 4.0]).expect("spec");

        let sequential = second
            .apply(&first.apply(&spectrum).expect("first"))
            .expect("second");
        let composed = first.compose(&second).expect("compose");
        let direct = composed.apply(&spectrum).expect("direct");

        assert_eq!(composed.redshift(), 10.0);
        assert_relative_eq!(composed.dlnz(), 0.2, max_relative = 1.0e-12);
        for (lhs, rhs) in sequential.density().iter().zip(direct.density()) {
            assert_relative_eq!(*lhs, *rhs, max_relative = 1.0e-12);
        }
    }

    #[test]
    fn power_requires_square_operator() {
        let operator = DenseTransferFunction::new(
            grid(&[1.0, 2.0]),
            grid(&[1.0, 2.0, 4.0]),
            Mat::<f64>::zeros(2, 3),
            3.0,
            0.1,
        )
        .expect("op");
        assert!(matches!(
            operator.power(2),
            Err(SpectrumError::AbscissaMismatch { .. })
        ));
        assert!(matches!(
            operator.power(0),
            Err(SpectrumError::InvalidArgument(_))
        ));
    }
}
