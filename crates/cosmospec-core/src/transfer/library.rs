use super::sequence::TransferOperatorSequence;
use crate::domain::{SpectrumError, SpectrumResult};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Families of precomputed transfer operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorKind {
    HighEnergyPhoton,
    LowEnergyPhoton,
    LowEnergyElectron,
    HighEnergyDeposition,
    CmbEnergyLoss,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 5] = [
        Self::HighEnergyPhoton,
        Self::LowEnergyPhoton,
        Self::LowEnergyElectron,
        Self::HighEnergyDeposition,
        Self::CmbEnergyLoss,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighEnergyPhoton => "highengphot",
            Self::LowEnergyPhoton => "lowengphot",
            Self::LowEnergyElectron => "lowengelec",
            Self::HighEnergyDeposition => "highengdep",
            Self::CmbEnergyLoss => "CMB_engloss",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(token))
    }
}

impl Display for OperatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Operator sequences loaded once at startup and handed to whoever builds an
/// evolution, keyed by [`OperatorKind`].
#[derive(Debug, Clone)]
pub struct OperatorLibrary<Op> {
    sequences: BTreeMap<OperatorKind, TransferOperatorSequence<Op>>,
}

impl<Op> Default for OperatorLibrary<Op> {
    fn default() -> Self {
        Self {
            sequences: BTreeMap::new(),
        }
    }
}

impl<Op> OperatorLibrary<Op> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sequence` under `kind`, returning the one it replaces.
    pub fn insert(
        &mut self,
        kind: OperatorKind,
        sequence: TransferOperatorSequence<Op>,
    ) -> Option<TransferOperatorSequence<Op>> {
        self.sequences.insert(kind, sequence)
    }

    pub fn with(mut self, kind: OperatorKind, sequence: TransferOperatorSequence<Op>) -> Self {
        self.sequences.insert(kind, sequence);
        self
    }

    pub fn get(&self, kind: OperatorKind) -> Option<&TransferOperatorSequence<Op>> {
        self.sequences.get(&kind)
    }

    pub fn require(&self, kind: OperatorKind) -> SpectrumResult<&TransferOperatorSequence<Op>> {
        self.get(kind).ok_or(SpectrumError::MissingOperator {
            kind: kind.as_str(),
        })
    }

    pub fn kinds(&self) -> impl Iterator<Item = OperatorKind> + '_ {
        self.sequences.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}
