//! Directional contamination scoring from shared allele fractions

use crate::matcher::SharedVariant;

/// Which table of a pair a value refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

/// Scoring result for one pair
#[derive(Debug, Clone, Copy)]
pub struct ContaminationScore {
    pub mean_fraction_a: f64, // NaN when nothing is shared
    pub mean_fraction_b: f64,
    pub pct_a_to_b: u32,
    pub pct_b_to_a: u32,
    pub primary: Side,
}

impl ContaminationScore {
    /// True when the percentages carry evidence rather than the 0/0 default
    pub fn has_signal(&self) -> bool {
        let total = self.mean_fraction_a + self.mean_fraction_b;
        total > 0.0
    }
}

/// Arithmetic mean, NaN for an empty input
pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Percentage of `part` in `total`, rounded half away from zero.
///
/// Returns 0 unless `total` is strictly positive.
pub fn contamination_percentage(part: f64, total: f64) -> u32 {
    if total > 0.0 {
        let pct = (part / total * 100.0).round();
        pct.clamp(0.0, 100.0) as u32
    } else {
        0
    }
}

/// Score a pair from its shared variants.
///
/// The two percentages are rounded independently and may sum to 99 or 101.
/// With nothing shared both are 0 and B is reported as the primary source;
/// B also wins exact ties.
pub fn score(shared: &[SharedVariant]) -> ContaminationScore {
    let mean_fraction_a = mean(shared.iter().map(|s| s.fraction_a));
    let mean_fraction_b = mean(shared.iter().map(|s| s.fraction_b));
    let total = mean_fraction_a + mean_fraction_b;

    let primary = if mean_fraction_a > mean_fraction_b {
        Side::A
    } else {
        Side::B
    };

    ContaminationScore {
        mean_fraction_a,
        mean_fraction_b,
        pct_a_to_b: contamination_percentage(mean_fraction_a, total),
        pct_b_to_a: contamination_percentage(mean_fraction_b, total),
        primary,
    }
}
