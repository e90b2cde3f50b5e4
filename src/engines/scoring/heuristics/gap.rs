use super::{occurrences, NEUTRAL_SCORE};
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::{ScoreVector, CANDIDATE_COUNT, MAX_CANDIDATE, MIN_CANDIDATE};

const DEFAULT_MEAN_GAP: f64 = 7.0;

/// Scores candidates by how often they open or close a draw, and predicts an
/// evenly stepped run from the most common opening candidate.
pub struct GapEngine {
    scores: ScoreVector,
    first_mode: u8,
    mean_gap: f64,
}

impl GapEngine {
    pub const ID: &'static str = "gap";

    pub fn new(history: &DrawHistory) -> Self {
        let total = history.len();
        if total == 0 {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
                first_mode: MIN_CANDIDATE,
                mean_gap: DEFAULT_MEAN_GAP,
            };
        }

        let mut first = [0usize; CANDIDATE_COUNT];
        let mut last = [0usize; CANDIDATE_COUNT];
        let mut gap_sum = 0usize;
        for draw in history.iter() {
            let numbers = draw.numbers.numbers();
            first[(numbers[0] - 1) as usize] += 1;
            last[(numbers[5] - 1) as usize] += 1;
            gap_sum += numbers.windows(2).map(|w| (w[1] - w[0]) as usize).sum::<usize>();
        }
        let all = occurrences(history.draws());

        let n = total as f64;
        let scores = ScoreVector::from_fn(|c| {
            let idx = (c - 1) as usize;
            first[idx] as f64 / n * 0.4 + last[idx] as f64 / n * 0.4 + all[idx] as f64 / n * 0.2
        })
        .normalized_by_max();

        // Ties go to the lower candidate.
        let first_mode = (MIN_CANDIDATE..=MAX_CANDIDATE)
            .max_by(|a, b| {
                first[(*a - 1) as usize]
                    .cmp(&first[(*b - 1) as usize])
                    .then(b.cmp(a))
            })
            .unwrap_or(MIN_CANDIDATE);

        Self {
            scores,
            first_mode,
            mean_gap: gap_sum as f64 / (total * 5) as f64,
        }
    }
}

impl ScoringEngine for GapEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Ok(self.scores.clone())
    }

    fn predict(&self, k: usize) -> anyhow::Result<Vec<u8>> {
        let step = self.mean_gap.trunc() as i64;
        let mut picks: Vec<u8> = (0..k as i64)
            .map(|i| {
                (self.first_mode as i64 + i * step)
                    .clamp(MIN_CANDIDATE as i64, MAX_CANDIDATE as i64) as u8
            })
            .collect();
        picks.sort_unstable();
        picks.dedup();

        let mut filler = MIN_CANDIDATE..=MAX_CANDIDATE;
        while picks.len() < k {
            match filler.next() {
                Some(c) if !picks.contains(&c) => picks.push(c),
                Some(_) => {}
                None => break,
            }
        }
        picks.sort_unstable();
        Ok(picks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepped_prediction() {
        let history = DrawHistory::from_rows(vec![
            (1, [2, 9, 16, 23, 30, 37]),
            (2, [2, 9, 16, 23, 30, 37]),
        ])
        .unwrap();
        let engine = GapEngine::new(&history);
        assert_eq!(engine.predict(6).unwrap(), vec![2, 9, 16, 23, 30, 37]);
        assert_eq!(engine.scores().unwrap().max(), 1.0);
    }

    #[test]
    fn test_clamped_steps_are_filled() {
        let history = DrawHistory::from_rows(vec![
            (1, [30, 40, 41, 42, 43, 44]),
            (2, [30, 40, 41, 42, 43, 44]),
            (3, [1, 12, 23, 34, 44, 45]),
        ])
        .unwrap();
        let prediction = GapEngine::new(&history).predict(6).unwrap();
        assert_eq!(prediction, vec![1, 30, 34, 38, 42, 45]);
    }
}
