//! Conservative spectral bookkeeping: energy grids, spectra and rebinning.

pub mod density;
pub mod grid;
pub mod rebin;

pub use density::{Spectrum, UNSET_EPOCH, Underflow};
pub use grid::{EnergyGrid, bin_boundaries};
pub use rebin::{discretize, discretize_default, rebin};
