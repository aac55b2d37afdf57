//! Sequential application of transfer operators across redshift steps.
//!
//! Each step's output is the only input of the next, so a single spectrum is
//! always evolved serially. Independent initial spectra may be evolved side by
//! side with [`evolve_independent`].

use crate::domain::{SpectrumError, SpectrumResult};
use crate::spectrum::Spectrum;
use crate::transfer::{TransferOperator, TransferOperatorSequence};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvolutionMode {
    /// Keep only the current spectrum.
    #[default]
    Collapsed,
    /// Keep every intermediate spectrum.
    Recording,
}

/// Append-only record of spectra, seeded with the initial state.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumHistory {
    spectra: Vec<Spectrum>,
}

impl SpectrumHistory {
    fn seeded(initial: Spectrum) -> Self {
        Self {
            spectra: vec![initial],
        }
    }

    pub fn last(&self) -> &Spectrum {
        // Never empty: construction always seeds one entry.
        &self.spectra[self.spectra.len() - 1]
    }

    pub fn first(&self) -> &Spectrum {
        &self.spectra[0]
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Spectrum> {
        self.spectra.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Spectrum> {
        self.spectra.iter()
    }

    pub fn redshifts(&self) -> Vec<f64> {
        self.spectra.iter().map(|spectrum| spectrum.epoch).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvolutionOutcome {
    Final(Spectrum),
    History(SpectrumHistory),
}

impl EvolutionOutcome {
    /// The spectrum reached at the end of the evolution.
    pub fn final_spectrum(&self) -> &Spectrum {
        match self {
            Self::Final(spectrum) => spectrum,
            Self::History(history) => history.last(),
        }
    }
}

/// Drives spectra through a [`TransferOperatorSequence`].
#[derive(Debug, Clone, Copy)]
pub struct Evolver<'a, Op> {
    sequence: &'a TransferOperatorSequence<Op>,
    end_redshift: Option<f64>,
}

impl<'a, Op: TransferOperator> Evolver<'a, Op> {
    pub fn new(sequence: &'a TransferOperatorSequence<Op>) -> Self {
        Self {
            sequence,
            end_redshift: None,
        }
    }

    /// Stops before the first step that would cross below `end_redshift`.
    pub fn until(mut self, end_redshift: f64) -> Self {
        self.end_redshift = Some(end_redshift);
        self
    }

    pub fn steps(&self) -> usize {
        self.sequence.stopping_index(self.end_redshift)
    }

    /// Collapsed mode: advances `spectrum` in place.
    pub fn run_in_place(&self, spectrum: &mut Spectrum) -> SpectrumResult<()> {
        self.check_entry(spectrum)?;
        let steps = self.steps();
        debug!(
            mode = "collapsed",
            steps,
            end_redshift = ?self.end_redshift,
            "evolving spectrum"
        );

        for index in 0..steps {
            *spectrum = self.step(index, spectrum)?;
        }
        Ok(())
    }

    /// Recording mode: returns every state, starting with a copy of `initial`.
    pub fn run_recording(&self, initial: &Spectrum) -> SpectrumResult<SpectrumHistory> {
        self.check_entry(initial)?;
        let steps = self.steps();
        debug!(
            mode = "recording",
            steps,
            end_redshift = ?self.end_redshift,
            "evolving spectrum"
        );

        let mut history = SpectrumHistory::seeded(initial.clone());
        history.spectra.reserve(steps);
        for index in 0..steps {
            let next = self.step(index, history.last())?;
            history.spectra.push(next);
        }
        Ok(history)
    }

    fn step(&self, index: usize, current: &Spectrum) -> SpectrumResult<Spectrum> {
        let operator = self.operator(index)?;
        let mut next = operator.apply(current)?;
        next.epoch = self.sequence.redshifts()[index + 1];
        trace!(
            step = index,
            from = operator.redshift(),
            to = next.epoch,
            total_energy = next.total_energy(),
            "applied transfer operator"
        );
        Ok(next)
    }

    fn operator(&self, index: usize) -> SpectrumResult<&'a Op> {
        self.sequence.get(index).ok_or_else(|| {
            SpectrumError::InvalidArgument(format!(
                "operator index {index} out of range for {} operators",
                self.sequence.len()
            ))
        })
    }

    fn check_entry(&self, spectrum: &Spectrum) -> SpectrumResult<()> {
        if spectrum.grid().same_abscissa(self.sequence.in_grid()) {
            Ok(())
        } else {
            Err(SpectrumError::AbscissaMismatch {
                context: "evolution entry spectrum",
            })
        }
    }
}

/// Evolves `spectrum` through `sequence` in the requested mode.
pub fn evolve<Op: TransferOperator>(
    mut spectrum: Spectrum,
    sequence: &TransferOperatorSequence<Op>,
    end_redshift: Option<f64>,
    mode: EvolutionMode,
) -> SpectrumResult<EvolutionOutcome> {
    let mut evolver = Evolver::new(sequence);
    if let Some(end_redshift) = end_redshift {
        evolver = evolver.until(end_redshift);
    }

    match mode {
        EvolutionMode::Collapsed => {
            evolver.run_in_place(&mut spectrum)?;
            Ok(EvolutionOutcome::Final(spectrum))
        }
        EvolutionMode::Recording => evolver.run_recording(&spectrum).map(EvolutionOutcome::History),
    }
}

/// Evolves several independent initial spectra in collapsed mode.
pub fn evolve_independent<Op: TransferOperator>(
    spectra: &mut [Spectrum],
    sequence: &TransferOperatorSequence<Op>,
    end_redshift: Option<f64>,
) -> SpectrumResult<()> {
    let mut evolver = Evolver::new(sequence);
    if let Some(end_redshift) = end_redshift {
        evolver = evolver.until(end_redshift);
    }
    spectra
        .iter_mut()
        .try_for_each(|spectrum| evolver.run_in_place(spectrum))
}
