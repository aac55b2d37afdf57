/// Where a value falls relative to an ascending sequence of bin centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinPosition {
    Below,
    /// Continuous index: `k` sits exactly on center `k`, fractions interpolate
    /// linearly between neighbouring centers.
    At(f64),
    Above,
}

/// Binary search plus linear interpolation of the index number.
///
/// `centers` must be strictly increasing and hold at least two values. The
/// last center maps to exactly `centers.len() - 1`.
pub fn fractional_index(value: f64, centers: &[f64]) -> BinPosition {
    let Some((&first, &last)) = centers.first().zip(centers.last()) else {
        return BinPosition::Below;
    };

    if value.is_nan() || value < first {
        return BinPosition::Below;
    }
    if value > last {
        return BinPosition::Above;
    }
    if value == last {
        return BinPosition::At((centers.len() - 1) as f64);
    }

    let upper = centers.partition_point(|center| *center <= value);
    let lower = upper - 1;
    let span = centers[upper] - centers[lower];
    BinPosition::At(lower as f64 + (value - centers[lower]) / span)
}
