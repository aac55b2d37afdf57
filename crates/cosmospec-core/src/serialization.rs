use crate::evolve::SpectrumHistory;
use crate::spectrum::Spectrum;
use serde::Serialize;

/// JSON-facing snapshot of a [`Spectrum`] with its conserved totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumReport {
    pub redshift: f64,
    pub energies: Vec<f64>,
    pub dnde: Vec<f64>,
    pub total_number: f64,
    pub total_energy: f64,
    pub underflow_number: f64,
    pub underflow_energy: f64,
}

impl From<&Spectrum> for SpectrumReport {
    fn from(spectrum: &Spectrum) -> Self {
        Self {
            redshift: spectrum.epoch,
            energies: spectrum.energies().to_vec(),
            dnde: spectrum.density().to_vec(),
            total_number: spectrum.total_number(),
            total_energy: spectrum.total_energy(),
            underflow_number: spectrum.underflow.number,
            underflow_energy: spectrum.underflow.energy,
        }
    }
}

pub fn history_reports(history: &SpectrumHistory) -> Vec<SpectrumReport> {
    history.iter().map(SpectrumReport::from).collect()
}
