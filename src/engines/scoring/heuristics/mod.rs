//! Built-in lightweight scoring heuristics.
//!
//! Each engine computes its score vector once at construction and returns a
//! neutral uniform vector when the history is too short to analyse.

pub mod frequency;
pub mod poisson;
pub mod gap;
pub mod graph;
pub mod pattern;
pub mod transition;
pub mod sequence;
pub mod timeseries;
pub mod spectral;
pub mod numerology;

pub use frequency::{FrequencyEngine, HotColdSummary};
pub use poisson::PoissonEngine;
pub use gap::GapEngine;
pub use graph::GraphEngine;
pub use pattern::PatternEngine;
pub use transition::TransitionEngine;
pub use sequence::SequenceEngine;
pub use timeseries::TimeSeriesEngine;
pub use spectral::SpectralEngine;
pub use numerology::NumerologyEngine;

use crate::types::{HistoricalDraw, CANDIDATE_COUNT};

pub(crate) const NEUTRAL_SCORE: f64 = 0.5;

/// Occurrences per candidate; index 0 holds candidate 1.
pub(crate) fn occurrences(draws: &[HistoricalDraw]) -> [usize; CANDIDATE_COUNT] {
    let mut counts = [0usize; CANDIDATE_COUNT];
    for draw in draws {
        for n in draw.numbers.numbers() {
            counts[(*n - 1) as usize] += 1;
        }
    }
    counts
}

/// Draw indices containing `candidate`, ascending.
pub(crate) fn appearances(draws: &[HistoricalDraw], candidate: u8) -> Vec<usize> {
    draws
        .iter()
        .enumerate()
        .filter(|(_, d)| d.numbers.contains(candidate))
        .map(|(i, _)| i)
        .collect()
}

/// Maximum of `values`, or 1.0 when nothing is positive.
pub(crate) fn positive_max<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let max = values.into_iter().fold(0.0, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::data::DrawHistory;
    use rand::rngs::StdRng;
    use rand::seq::index::sample;
    use rand::SeedableRng;

    /// Deterministic pseudo-random history.
    pub fn random_history(rounds: usize, seed: u64) -> DrawHistory {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = (0..rounds).map(|i| {
            let picks = sample(&mut rng, 45, 6);
            let mut numbers = [0u8; 6];
            for (slot, idx) in numbers.iter_mut().zip(picks.iter()) {
                *slot = idx as u8 + 1;
            }
            (i as u32 + 1, numbers)
        });
        DrawHistory::from_rows(rows).unwrap()
    }

    pub fn assert_unit_range(scores: &crate::types::ScoreVector) {
        for (candidate, value) in scores.iter() {
            assert!(
                (0.0..=1.0 + 1e-12).contains(&value),
                "candidate {} scored {}",
                candidate,
                value
            );
        }
    }
}
