//! Conservative spectral remapping and redshift evolution of injected
//! particle spectra.
//!
//! Spectra live on immutable log-binned [`spectrum::EnergyGrid`]s. [`spectrum::rebin`]
//! and [`spectrum::discretize`] move particles between grids while conserving
//! number and energy, and [`evolve::Evolver`] composes a sequence of
//! [`transfer::TransferOperator`]s against a spectrum step by step.

pub mod channels;
pub mod common;
pub mod domain;
pub mod evolve;
pub mod numerics;
pub mod serialization;
pub mod spectrum;
pub mod transfer;
