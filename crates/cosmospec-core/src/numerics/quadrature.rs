use crate::domain::{SpectrumError, SpectrumResult};
use serde::{Deserialize, Serialize};

use super::stable_sum_iter;

const INITIAL_PANELS: usize = 16;
const MAX_PANELS: usize = 1 << 14;
const ROUND_OFF: f64 = 50.0 * f64::EPSILON;

/// Convergence controls for [`integrate_adaptive`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationTolerance {
    pub abs_tol: f64,
    pub rel_tol: f64,
    /// Bisections allowed below any one of the initial panels.
    pub max_depth: u32,
}

impl Default for IntegrationTolerance {
    fn default() -> Self {
        Self {
            abs_tol: 0.0,
            rel_tol: 1.0e-3,
            max_depth: 48,
        }
    }
}

/// Simpson panel together with its once-bisected estimate.
struct Panel {
    low: f64,
    high: f64,
    f_low: f64,
    f_mid: f64,
    f_high: f64,
    refined: f64,
    error: f64,
    depth: u32,
}

impl Panel {
    fn new<F: Fn(f64) -> f64>(f: &F, low: f64, high: f64, f_low: f64, f_high: f64, depth: u32) -> Self {
        let mid = 0.5 * (low + high);
        let f_mid = f(mid);
        let coarse = simpson(low, high, f_low, f_mid, f_high);
        let refined = simpson(low, mid, f_low, f(0.5 * (low + mid)), f_mid)
            + simpson(mid, high, f_mid, f(0.5 * (mid + high)), f_high);
        Self {
            low,
            high,
            f_low,
            f_mid,
            f_high,
            refined,
            error: (refined - coarse).abs(),
            depth,
        }
    }

    fn bisect<F: Fn(f64) -> f64>(&self, f: &F) -> (Panel, Panel) {
        let mid = 0.5 * (self.low + self.high);
        (
            Panel::new(f, self.low, mid, self.f_low, self.f_mid, self.depth + 1),
            Panel::new(f, mid, self.high, self.f_mid, self.f_high, self.depth + 1),
        )
    }
}

/// Globally adaptive Simpson quadrature of `f` over `[low, high]`.
///
/// The interval starts as a row of equal panels. The panel with the largest
/// error estimate is bisected until the summed estimate drops to
/// `max(abs_tol, rel_tol * |integral|)`, so the tolerance bounds the whole
/// integral rather than each panel. A panel that would need more than
/// `max_depth` bisections aborts with [`SpectrumError::Integration`].
pub fn integrate_adaptive<F>(
    f: F,
    low: f64,
    high: f64,
    tolerance: IntegrationTolerance,
) -> SpectrumResult<f64>
where
    F: Fn(f64) -> f64,
{
    if !low.is_finite() || !high.is_finite() {
        return Err(SpectrumError::InvalidArgument(format!(
            "integration bounds must be finite, got [{low}, {high}]"
        )));
    }
    if low == high {
        return Ok(0.0);
    }
    if high < low {
        return integrate_adaptive(f, high, low, tolerance).map(|value| -value);
    }

    let width = (high - low) / INITIAL_PANELS as f64;
    let edges: Vec<f64> = (0..=INITIAL_PANELS)
        .map(|index| {
            if index == INITIAL_PANELS {
                high
            } else {
                low + width * index as f64
            }
        })
        .collect();
    let values: Vec<f64> = edges.iter().map(|&edge| f(edge)).collect();
    let mut panels: Vec<Panel> = edges
        .windows(2)
        .zip(values.windows(2))
        .map(|(bounds, ends)| Panel::new(&f, bounds[0], bounds[1], ends[0], ends[1], 0))
        .collect();

    loop {
        let total = stable_sum_iter(panels.iter().map(|panel| panel.refined));
        if !total.is_finite() {
            return Err(SpectrumError::NonFiniteValue {
                context: "integrand",
                index: panels.len(),
                value: total,
            });
        }

        let error = stable_sum_iter(panels.iter().map(|panel| panel.error));
        let magnitude = stable_sum_iter(panels.iter().map(|panel| panel.refined.abs()));
        let threshold = tolerance.abs_tol.max(tolerance.rel_tol * total.abs());
        if error <= threshold || error <= ROUND_OFF * magnitude {
            return Ok(total);
        }

        let Some(worst) = panels
            .iter()
            .enumerate()
            .max_by(|(_, lhs), (_, rhs)| lhs.error.total_cmp(&rhs.error))
            .map(|(index, _)| index)
        else {
            return Ok(total);
        };
        let panel = &panels[worst];
        if panel.depth >= tolerance.max_depth || panels.len() >= MAX_PANELS {
            return Err(SpectrumError::Integration {
                low: panel.low,
                high: panel.high,
                max_depth: tolerance.max_depth,
            });
        }

        let (left, right) = panel.bisect(&f);
        panels[worst] = left;
        panels.push(right);
    }
}

fn simpson(low: f64, high: f64, f_low: f64, f_mid: f64, f_high: f64) -> f64 {
    (high - low) / 6.0 * (f_low + 4.0 * f_mid + f_high)
}

#[cfg(test)]
mod tests {
    use super::{IntegrationTolerance, integrate_adaptive};
    use crate::domain::SpectrumError;

    fn tight() -> IntegrationTolerance {
        IntegrationTolerance {
            abs_tol: 0.0,
            rel_tol: 1.0e-10,
            max_depth: 40,
        }
    }

    #[test]
    fn polynomials_up_to_cubic_are_exact() {
        let value = integrate_adaptive(|x| x * x * x - 2.0 * x + 1.0, 0.0, 2.0, tight())
            .expect("integral");
        assert!((value - 2.0).abs() < 1.0e-12);
    }

    #[test]
    fn power_law_matches_closed_form() {
        let value =
            integrate_adaptive(|x| x.powf(-1.5), 1.0, 100.0, tight()).expect("integral");
        let expected = 2.0 * (1.0 - 0.1);
        assert!((value - expected).abs() < 1.0e-6);
    }

    #[test]
    fn reversed_bounds_flip_sign_and_empty_interval_is_zero() {
        let forward = integrate_adaptive(|x| x, 1.0, 3.0, tight()).expect("forward");
        let backward = integrate_adaptive(|x| x, 3.0, 1.0, tight()).expect("backward");
        assert!((forward + backward).abs() < 1.0e-12);
        assert_eq!(integrate_adaptive(|x| x, 2.0, 2.0, tight()), Ok(0.0));
    }

    #[test]
    fn zero_integrand_converges_with_zero_absolute_tolerance() {
        let value = integrate_adaptive(|_| 0.0, 1.0, 2.0, IntegrationTolerance::default())
            .expect("integral");
        assert_eq!(value, 0.0);
    }

    #[test]
    fn step_function_meets_default_relative_tolerance() {
        let step = |x: f64| if x < 1.3 { 1.0 } else { 0.0 };
        let tolerance = IntegrationTolerance::default();
        let value = integrate_adaptive(step, 1.0, 2.0, tolerance).expect("integral");
        assert!((value - 0.3).abs() <= tolerance.rel_tol * 0.3);
    }

    #[test]
    fn narrow_spike_meets_default_relative_tolerance() {
        let spike = |x: f64| if x > 99.9 { 1.0e6 } else { 0.0 };
        let tolerance = IntegrationTolerance::default();
        let value = integrate_adaptive(spike, 80.0, 100.0, tolerance).expect("integral");
        assert!((value - 1.0e5).abs() <= tolerance.rel_tol * 1.0e5);
    }

    #[test]
    fn exhausted_depth_budget_is_integration_error() {
        let step = |x: f64| if x < 1.3 { 1.0 } else { 0.0 };
        let tolerance = IntegrationTolerance {
            max_depth: 0,
            ..IntegrationTolerance::default()
        };
        let error = integrate_adaptive(step, 1.0, 2.0, tolerance).expect_err("depth");
        assert!(matches!(error, SpectrumError::Integration { max_depth: 0, .. }));
    }

    #[test]
    fn non_finite_integrand_is_rejected() {
        let error = integrate_adaptive(|_| f64::NAN, 1.0, 2.0, tight()).expect_err("nan");
        assert!(matches!(error, SpectrumError::NonFiniteValue { .. }));
    }
}
