use crate::types::PICK_COUNT;
use serde::Serialize;
use std::collections::BTreeSet;

pub const AC_RANGE: (i32, i32) = (7, 10);
pub const SUM_RANGE: (u32, u32) = (100, 175);
pub const ODD_RANGE: (usize, usize) = (2, 4);
pub const MIN_DISTINCT_ENDINGS: usize = 4;
/// Candidates at or above this value count as high.
pub const HIGH_THRESHOLD: u8 = 23;
pub const BANDS: usize = 5;
const BAND_WIDTH: u8 = 9;

// Distance at which each partial-credit term reaches zero.
const AC_SPAN: f64 = 6.0;
const SUM_SPAN: f64 = 60.0;
const ODD_SPAN: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinationMetrics {
    pub sum: u32,
    /// Arithmetic complexity: distinct pairwise differences minus five
    pub ac: i32,
    pub consecutive_pairs: usize,
    pub odd_count: usize,
    pub high_count: usize,
    pub distinct_endings: usize,
    /// Picks per 9-wide band of 1..=45
    pub bands: [usize; BANDS],
}

impl CombinationMetrics {
    pub fn bands_covered(&self) -> usize {
        self.bands.iter().filter(|c| **c > 0).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub metrics: CombinationMetrics,
    pub violations: Vec<String>,
}

/// Structural rules derived from past winning combinations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombinationValidator;

impl CombinationValidator {
    pub fn new() -> Self {
        Self
    }

    /// Metrics of `numbers` (distinct candidates, any order).
    pub fn metrics(numbers: &[u8]) -> CombinationMetrics {
        let mut sorted = numbers.to_vec();
        sorted.sort_unstable();

        let mut differences = BTreeSet::new();
        for (i, a) in sorted.iter().enumerate() {
            for b in &sorted[i + 1..] {
                differences.insert(b - a);
            }
        }

        let mut bands = [0usize; BANDS];
        for n in &sorted {
            bands[((n.saturating_sub(1) / BAND_WIDTH) as usize).min(BANDS - 1)] += 1;
        }

        CombinationMetrics {
            sum: sorted.iter().map(|n| *n as u32).sum(),
            ac: differences.len() as i32 - (PICK_COUNT as i32 - 1),
            consecutive_pairs: sorted.windows(2).filter(|w| w[1] - w[0] == 1).count(),
            odd_count: sorted.iter().filter(|n| *n % 2 == 1).count(),
            high_count: sorted.iter().filter(|n| **n >= HIGH_THRESHOLD).count(),
            distinct_endings: sorted.iter().map(|n| n % 10).collect::<BTreeSet<_>>().len(),
            bands,
        }
    }

    pub fn validate(&self, numbers: &[u8]) -> ValidationReport {
        let metrics = Self::metrics(numbers);
        let mut violations = Vec::new();

        if !(AC_RANGE.0..=AC_RANGE.1).contains(&metrics.ac) {
            violations.push(format!("ac {} outside {}..={}", metrics.ac, AC_RANGE.0, AC_RANGE.1));
        }
        if !(SUM_RANGE.0..=SUM_RANGE.1).contains(&metrics.sum) {
            violations.push(format!(
                "sum {} outside {}..={}",
                metrics.sum, SUM_RANGE.0, SUM_RANGE.1
            ));
        }
        if !(ODD_RANGE.0..=ODD_RANGE.1).contains(&metrics.odd_count) {
            violations.push(format!(
                "{} odd candidates outside {}..={}",
                metrics.odd_count, ODD_RANGE.0, ODD_RANGE.1
            ));
        }
        if metrics.distinct_endings < MIN_DISTINCT_ENDINGS {
            violations.push(format!(
                "{} distinct endings, at least {} required",
                metrics.distinct_endings, MIN_DISTINCT_ENDINGS
            ));
        }

        ValidationReport {
            valid: violations.is_empty(),
            metrics,
            violations,
        }
    }

    pub fn is_valid(&self, numbers: &[u8]) -> bool {
        self.validate(numbers).valid
    }

    /// Graded quality in [0, 1]; each term decays linearly with the distance
    /// from its optimal range.
    pub fn score(&self, numbers: &[u8]) -> f64 {
        let m = Self::metrics(numbers);

        let ac = decay(
            range_distance(m.ac as f64, AC_RANGE.0 as f64, AC_RANGE.1 as f64),
            AC_SPAN,
        );
        let sum = decay(
            range_distance(m.sum as f64, SUM_RANGE.0 as f64, SUM_RANGE.1 as f64),
            SUM_SPAN,
        );
        let odd = decay(
            range_distance(m.odd_count as f64, ODD_RANGE.0 as f64, ODD_RANGE.1 as f64),
            ODD_SPAN,
        );
        let endings = (m.distinct_endings as f64 / PICK_COUNT as f64).min(1.0);
        let bands = m.bands_covered() as f64 / BANDS as f64;

        ac * 0.30 + sum * 0.25 + odd * 0.20 + endings * 0.15 + bands * 0.10
    }
}

pub(crate) fn range_distance(value: f64, low: f64, high: f64) -> f64 {
    if value < low {
        low - value
    } else if value > high {
        value - high
    } else {
        0.0
    }
}

pub(crate) fn decay(distance: f64, span: f64) -> f64 {
    (1.0 - distance / span).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_of_consecutive_run() {
        let m = CombinationValidator::metrics(&[6, 5, 4, 3, 2, 1]);
        assert_eq!(m.sum, 21);
        assert_eq!(m.consecutive_pairs, 5);
        assert_eq!(m.ac, 0);
        assert_eq!(m.odd_count, 3);
        assert_eq!(m.high_count, 0);
        assert_eq!(m.bands, [6, 0, 0, 0, 0]);
    }

    #[test]
    fn test_valid_combination() {
        let validator = CombinationValidator::new();
        let report = validator.validate(&[42, 3, 11, 20, 29, 36]);
        assert_eq!(report.metrics.ac, 9);
        assert_eq!(report.metrics.sum, 141);
        assert!(report.valid, "{:?}", report.violations);
        assert_eq!(report.metrics.bands_covered(), 5);
    }

    #[test]
    fn test_score_bounds() {
        let validator = CombinationValidator::new();
        let best = validator.score(&[3, 11, 20, 29, 36, 42]);
        let worst = validator.score(&[1, 2, 3, 4, 5, 6]);
        assert!((best - 1.0).abs() < 1e-12);
        assert!((worst - 0.37).abs() < 1e-12);
        assert!(worst >= 0.0 && worst < best);
    }

    #[test]
    fn test_decay_is_linear() {
        assert_eq!(decay(0.0, 6.0), 1.0);
        assert_eq!(decay(3.0, 6.0), 0.5);
        assert_eq!(decay(9.0, 6.0), 0.0);
        assert_eq!(range_distance(5.0, 7.0, 10.0), 2.0);
    }
}
