use super::InterpolationProvider;
use crate::domain::SpectrumResult;

/// Stable secondaries whose spectra are tabulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Secondary {
    /// Counted as e+e- pairs, i.e. twice the tabulated single-species value.
    Electron,
    Photon,
}

impl Secondary {
    pub fn log10_factor(self) -> f64 {
        match self {
            Self::Electron => 2.0_f64.log10(),
            Self::Photon => 0.0,
        }
    }
}

/// Two tabulated sub-channels and the weights they enter a primary with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSplit {
    pub parts: [&'static str; 2],
    pub weights: [f64; 2],
}

const HANDEDNESS: [f64; 2] = [0.5, 0.5];
// Two transverse polarizations, one longitudinal.
const POLARIZATION: [f64; 2] = [2.0 / 3.0, 1.0 / 3.0];

const SPLITS: [(&str, ChannelSplit); 5] = [
    (
        "e",
        ChannelSplit {
            parts: ["e_L", "e_R"],
            weights: HANDEDNESS,
        },
    ),
    (
        "mu",
        ChannelSplit {
            parts: ["mu_L", "mu_R"],
            weights: HANDEDNESS,
        },
    ),
    (
        "tau",
        ChannelSplit {
            parts: ["tau_L", "tau_R"],
            weights: HANDEDNESS,
        },
    ),
    (
        "W",
        ChannelSplit {
            parts: ["W_T", "W_L"],
            weights: POLARIZATION,
        },
    ),
    (
        "Z",
        ChannelSplit {
            parts: ["Z_T", "Z_L"],
            weights: POLARIZATION,
        },
    ),
];

/// Sub-channel split for a primary channel name. Channels without
/// handedness or polarization structure map onto themselves twice.
pub fn channel_split(primary: &str) -> Option<ChannelSplit> {
    if let Some((_, split)) = SPLITS.iter().find(|(name, _)| *name == primary) {
        return Some(*split);
    }
    const SINGLE: [&str; 23] = [
        "e_L", "e_R", "mu_L", "mu_R", "tau_L", "tau_R", "q", "c", "b", "t", "W_L", "W_T", "Z_L",
        "Z_T", "g", "gamma", "h", "nu_e", "nu_mu", "nu_tau", "VV_to_4e", "VV_to_4mu",
        "VV_to_4tau",
    ];
    SINGLE
        .iter()
        .find(|name| **name == primary)
        .map(|name| ChannelSplit {
            parts: [*name, *name],
            weights: HANDEDNESS,
        })
}

/// `log10(sum_k w_k * 10^v_k)`.
pub fn combine_log10(weights: &[f64], log10_values: &[f64]) -> Option<f64> {
    if weights.len() != log10_values.len() || weights.is_empty() {
        return None;
    }
    let linear: f64 = weights
        .iter()
        .zip(log10_values)
        .map(|(weight, value)| weight * 10.0_f64.powf(*value))
        .sum();
    Some(linear.log10())
}

/// Weighted combination of two sub-channel providers.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedChannel<P> {
    parts: [P; 2],
    weights: [f64; 2],
    secondary: Secondary,
}

impl<P: InterpolationProvider> CombinedChannel<P> {
    pub fn new(parts: [P; 2], weights: [f64; 2], secondary: Secondary) -> Self {
        Self {
            parts,
            weights,
            secondary,
        }
    }

    pub fn secondary(&self) -> Secondary {
        self.secondary
    }
}

impl<P: InterpolationProvider> InterpolationProvider for CombinedChannel<P> {
    /// Intersection of both parts' mass ranges.
    fn mass_range(&self) -> (f64, f64) {
        let (low_a, high_a) = self.parts[0].mass_range();
        let (low_b, high_b) = self.parts[1].mass_range();
        (low_a.max(low_b), high_a.min(high_b))
    }

    fn value(&self, mass: f64, log10_x: f64) -> SpectrumResult<f64> {
        self.check_mass(mass)?;
        let values = [
            self.parts[0].value(mass, log10_x)?,
            self.parts[1].value(mass, log10_x)?,
        ];
        let combined = combine_log10(&self.weights, &values).unwrap_or(f64::NEG_INFINITY);
        Ok(combined + self.secondary.log10_factor())
    }
}
