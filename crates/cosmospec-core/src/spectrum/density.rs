use super::grid::EnergyGrid;
use super::rebin::rebin;
use crate::domain::{SpectrumError, SpectrumResult};
use crate::numerics::stable_sum_iter;
use std::sync::Arc;

/// Redshift tag carried by spectra that have not been placed in time yet.
pub const UNSET_EPOCH: f64 = -1.0;

/// Particles and energy lost below the lowest representable bin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Underflow {
    pub number: f64,
    pub energy: f64,
}

impl Underflow {
    pub fn accumulate(&mut self, other: Underflow) {
        self.number += other.number;
        self.energy += other.energy;
    }

    pub fn is_empty(&self) -> bool {
        self.number == 0.0 && self.energy == 0.0
    }
}

/// `dN/dE` per bin over a shared [`EnergyGrid`], tagged with a redshift.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    grid: Arc<EnergyGrid>,
    density: Vec<f64>,
    pub epoch: f64,
    pub underflow: Underflow,
}

impl Spectrum {
    pub fn new(grid: Arc<EnergyGrid>, density: Vec<f64>, epoch: f64) -> SpectrumResult<Self> {
        if density.len() != grid.len() {
            return Err(SpectrumError::ShapeMismatch {
                context: "spectrum density",
                expected: grid.len(),
                actual: density.len(),
            });
        }
        Ok(Self {
            grid,
            density,
            epoch,
            underflow: Underflow::default(),
        })
    }

    pub fn zeros(grid: Arc<EnergyGrid>) -> Self {
        let density = vec![0.0; grid.len()];
        Self {
            grid,
            density,
            epoch: UNSET_EPOCH,
            underflow: Underflow::default(),
        }
    }

    /// Builds `dN/dE` from particle counts per bin.
    pub fn from_number(grid: Arc<EnergyGrid>, number: &[f64]) -> SpectrumResult<Self> {
        if number.len() != grid.len() {
            return Err(SpectrumError::ShapeMismatch {
                context: "number per bin",
                expected: grid.len(),
                actual: number.len(),
            });
        }
        let density = number
            .iter()
            .zip(grid.number_weights())
            .map(|(count, weight)| count / weight)
            .collect();
        Self::new(grid, density, UNSET_EPOCH)
    }

    pub fn grid(&self) -> &Arc<EnergyGrid> {
        &self.grid
    }

    pub fn energies(&self) -> &[f64] {
        self.grid.values()
    }

    pub fn density(&self) -> &[f64] {
        &self.density
    }

    pub fn len(&self) -> usize {
        self.density.len()
    }

    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    pub fn number_per_bin(&self) -> Vec<f64> {
        self.density
            .iter()
            .zip(self.grid.number_weights())
            .map(|(density, weight)| density * weight)
            .collect()
    }

    pub fn energy_per_bin(&self) -> Vec<f64> {
        self.number_per_bin()
            .into_iter()
            .zip(self.grid.values())
            .map(|(number, energy)| number * energy)
            .collect()
    }

    pub fn total_number(&self) -> f64 {
        stable_sum_iter(self.number_per_bin())
    }

    pub fn total_energy(&self) -> f64 {
        stable_sum_iter(self.energy_per_bin())
    }

    pub fn total_number_with_underflow(&self) -> f64 {
        self.total_number() + self.underflow.number
    }

    pub fn total_energy_with_underflow(&self) -> f64 {
        self.total_energy() + self.underflow.energy
    }

    /// Conservatively moves this spectrum onto `out_grid`.
    ///
    /// Existing underflow is carried forward and new losses are added to it.
    pub fn rebin(&self, out_grid: Arc<EnergyGrid>) -> SpectrumResult<Spectrum> {
        let mut rebinned = rebin(&self.number_per_bin(), self.grid.values(), out_grid)?;
        rebinned.epoch = self.epoch;
        rebinned.underflow.accumulate(self.underflow);
        Ok(rebinned)
    }

    pub fn add_assign_spectrum(&mut self, other: &Spectrum) -> SpectrumResult<()> {
        if !self.grid.same_abscissa(&other.grid) {
            return Err(SpectrumError::AbscissaMismatch {
                context: "spectrum addition",
            });
        }
        for (density, added) in self.density.iter_mut().zip(&other.density) {
            *density += added;
        }
        self.underflow.accumulate(other.underflow);
        Ok(())
    }

    pub fn scale(&mut self, factor: f64) {
        for density in &mut self.density {
            *density *= factor;
        }
    }
}
