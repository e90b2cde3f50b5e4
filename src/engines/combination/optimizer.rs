use super::validator::CombinationValidator;
use crate::data::DrawHistory;
use crate::error::{EnsembleError, Result};
use crate::types::{CandidateSubset, ScoreVector, MAX_CANDIDATE, MIN_CANDIDATE, PICK_COUNT};
use serde::Serialize;

pub const DEFAULT_SUM_MEAN: f64 = 138.0;
pub const DEFAULT_SUM_STD: f64 = 20.0;
/// Sum distance at which the selection sum fit reaches zero.
pub const SELECTION_SUM_TOLERANCE: f64 = 40.0;
/// Validator score used when validation is switched off.
pub const NEUTRAL_QUALITY: f64 = 0.5;

const SECTION_WIDTH: u8 = 10;
const SECTIONS: f64 = 5.0;

/// Preferred draw-sum band, one standard deviation around the historical mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SumRange {
    pub min: f64,
    pub max: f64,
}

impl SumRange {
    pub fn from_history(history: &DrawHistory) -> Self {
        let (mean, std) = history
            .sum_statistics()
            .unwrap_or((DEFAULT_SUM_MEAN, DEFAULT_SUM_STD));
        Self {
            min: mean - std,
            max: mean + std,
        }
    }

    /// 1.0 inside the band, decaying linearly to 0 at `tolerance` outside it.
    pub fn fit(&self, sum: u32, tolerance: f64) -> f64 {
        let sum = sum as f64;
        if (self.min..=self.max).contains(&sum) {
            return 1.0;
        }
        let distance = (sum - self.min).abs().min((sum - self.max).abs());
        (1.0 - distance / tolerance).max(0.0)
    }
}

impl Default for SumRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_SUM_MEAN - DEFAULT_SUM_STD,
            max: DEFAULT_SUM_MEAN + DEFAULT_SUM_STD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub subset: CandidateSubset,
    /// Composite selection score
    pub score: f64,
    pub valid: bool,
}

/// Exhaustive search over the top of a ranking, plus single-swap repair.
#[derive(Debug, Clone)]
pub struct CombinationOptimizer {
    validator: Option<CombinationValidator>,
    sum_range: SumRange,
    candidate_pool: usize,
}

impl CombinationOptimizer {
    pub fn new(
        validator: Option<CombinationValidator>,
        sum_range: SumRange,
        candidate_pool: usize,
    ) -> Self {
        Self {
            validator,
            sum_range,
            candidate_pool,
        }
    }

    pub fn validator(&self) -> Option<&CombinationValidator> {
        self.validator.as_ref()
    }

    pub fn sum_range(&self) -> SumRange {
        self.sum_range
    }

    fn quality(&self, numbers: &[u8]) -> f64 {
        self.validator
            .as_ref()
            .map_or(NEUTRAL_QUALITY, |v| v.score(numbers))
    }

    fn is_valid(&self, numbers: &[u8]) -> bool {
        self.validator.as_ref().map_or(true, |v| v.is_valid(numbers))
    }

    /// Composite: sum fit 25%, mean candidate score 30%, validator 30%,
    /// 10-wide section coverage 15%.
    pub fn composite_score(&self, numbers: &[u8], scores: &ScoreVector) -> f64 {
        let sum: u32 = numbers.iter().map(|n| *n as u32).sum();
        let sum_fit = self.sum_range.fit(sum, SELECTION_SUM_TOLERANCE);
        let mean_score = numbers.iter().map(|n| scores.get(*n)).sum::<f64>() / numbers.len() as f64;

        let mut sections = [false; 5];
        for n in numbers {
            sections[((n - 1) / SECTION_WIDTH) as usize] = true;
        }
        let coverage = sections.iter().filter(|s| **s).count() as f64 / SECTIONS;

        sum_fit * 0.25 + mean_score * 0.30 + self.quality(numbers) * 0.30 + coverage * 0.15
    }

    /// Best 6-subset of the top `candidate_pool` entries of `ranked`.
    ///
    /// Enumeration is lexicographic over ranking positions and only a strictly
    /// greater score replaces the incumbent.
    pub fn select(&self, ranked: &[(u8, f64)]) -> Result<Selection> {
        let pool: Vec<u8> = ranked
            .iter()
            .take(self.candidate_pool)
            .map(|(c, _)| *c)
            .collect();
        if pool.len() < PICK_COUNT {
            return Err(EnsembleError::InvalidCombination(format!(
                "need at least {} ranked candidates, got {}",
                PICK_COUNT,
                pool.len()
            )));
        }

        let mut scores = ScoreVector::zeros();
        for (candidate, score) in ranked {
            scores.set(*candidate, *score);
        }

        let mut best: Option<([u8; PICK_COUNT], f64)> = None;
        let mut indices: [usize; PICK_COUNT] = std::array::from_fn(|i| i);
        loop {
            let combo: [u8; PICK_COUNT] = indices.map(|i| pool[i]);
            let score = self.composite_score(&combo, &scores);
            if best.map_or(true, |(_, incumbent)| score > incumbent) {
                best = Some((combo, score));
            }
            if !next_combination(&mut indices, pool.len()) {
                break;
            }
        }

        let (combo, score) = best.ok_or_else(|| {
            EnsembleError::InvalidCombination("no combination enumerated".to_string())
        })?;
        let subset = CandidateSubset::new(&combo)?;
        Ok(Selection {
            valid: self.is_valid(subset.as_slice()),
            subset,
            score,
        })
    }

    /// One pass of best single-position substitution. Valid input, or any
    /// input when validation is off, comes back unchanged.
    pub fn repair(&self, initial: &CandidateSubset) -> CandidateSubset {
        let Some(validator) = &self.validator else {
            return *initial;
        };
        if validator.is_valid(initial.as_slice()) {
            return *initial;
        }

        let current = *initial.numbers();
        let mut best = current;
        let mut best_score = validator.score(&current);
        for position in 0..PICK_COUNT {
            for replacement in MIN_CANDIDATE..=MAX_CANDIDATE {
                if current.contains(&replacement) {
                    continue;
                }
                let mut trial = current;
                trial[position] = replacement;
                let score = validator.score(&trial);
                if score > best_score {
                    best_score = score;
                    best = trial;
                }
            }
        }
        CandidateSubset::from_distinct(best)
    }
}

/// Advance to the next k-combination of `0..n` in lexicographic order.
fn next_combination(indices: &mut [usize], n: usize) -> bool {
    let k = indices.len();
    let Some(pivot) = (0..k).rev().find(|&i| indices[i] < n - k + i) else {
        return false;
    };
    indices[pivot] += 1;
    for i in pivot + 1..k {
        indices[i] = indices[i - 1] + 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked_descending() -> Vec<(u8, f64)> {
        (1..=45u8).map(|c| (c, 1.0 - c as f64 / 100.0)).collect()
    }

    #[test]
    fn test_combination_count() {
        let mut indices = [0, 1, 2, 3, 4, 5];
        let mut count = 1;
        while next_combination(&mut indices, 20) {
            count += 1;
        }
        assert_eq!(count, 38_760);
        assert_eq!(indices, [14, 15, 16, 17, 18, 19]);
    }

    #[test]
    fn test_select_stays_in_pool() {
        let optimizer =
            CombinationOptimizer::new(Some(CombinationValidator::new()), SumRange::default(), 20);
        let ranked: Vec<(u8, f64)> = ranked_descending().into_iter().rev().collect();
        let selection = optimizer.select(&ranked).unwrap();
        assert!(selection.subset.as_slice().iter().all(|c| *c >= 26));
        assert!(selection.score > 0.0 && selection.score <= 1.0);
    }

    #[test]
    fn test_select_needs_six_candidates() {
        let optimizer = CombinationOptimizer::new(None, SumRange::default(), 20);
        assert!(optimizer.select(&ranked_descending()[..5]).is_err());
    }

    #[test]
    fn test_sum_fit() {
        let range = SumRange { min: 118.0, max: 158.0 };
        assert_eq!(range.fit(130, 40.0), 1.0);
        assert_eq!(range.fit(98, 40.0), 0.5);
        assert_eq!(range.fit(20, 40.0), 0.0);
    }

    #[test]
    fn test_repair_without_validator_is_identity() {
        let optimizer = CombinationOptimizer::new(None, SumRange::default(), 20);
        let subset = CandidateSubset::new(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(optimizer.repair(&subset), subset);
    }
}
