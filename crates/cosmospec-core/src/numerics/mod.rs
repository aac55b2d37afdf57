pub mod lookup;
pub mod quadrature;

pub use lookup::{BinPosition, fractional_index};
pub use quadrature::{IntegrationTolerance, integrate_adaptive};

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum_iter(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

pub fn log_spaced(low: f64, high: f64, count: usize) -> Option<Vec<f64>> {
    if count < 2 || !low.is_finite() || !high.is_finite() || low <= 0.0 || high <= low {
        return None;
    }

    let log_low = low.ln();
    let step = (high.ln() - log_low) / ((count - 1) as f64);
    let mut grid: Vec<f64> = (0..count)
        .map(|index| (log_low + step * index as f64).exp())
        .collect();

    grid[0] = low;
    if let Some(last) = grid.last_mut() {
        *last = high;
    }

    Some(grid)
}

pub fn relative_difference(lhs: f64, rhs: f64, relative_floor: f64) -> f64 {
    let scale = lhs.abs().max(rhs.abs()).max(relative_floor);
    (lhs - rhs).abs() / scale
}
