use super::{positive_max, NEUTRAL_SCORE};
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::{HistoricalDraw, ScoreVector, CANDIDATE_COUNT};
use std::collections::BTreeSet;

const LOOKBACK: usize = 3;
const SIMILARITY_THRESHOLD: f64 = 0.3;
const FOLLOWERS_PER_NUMBER: usize = 6;
const FOLLOWER_LIST: usize = 10;

/// Correlation between consecutive rounds: what followed windows similar to
/// the most recent one, and which candidates typically follow the last draw.
pub struct SequenceEngine {
    scores: ScoreVector,
}

impl SequenceEngine {
    pub const ID: &'static str = "sequence";

    pub fn new(history: &DrawHistory) -> Self {
        if history.len() < 2 {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
            };
        }

        let next = similar_window_followers(history);
        let max_next = positive_max(next.iter().copied());
        let followers = likely_followers(history);
        let listed = followers.len() as f64;

        let scores = ScoreVector::from_fn(|c| {
            let follower = followers
                .iter()
                .position(|f| *f == c)
                .map(|rank| (listed - rank as f64) / listed)
                .unwrap_or(0.0);
            next[(c - 1) as usize] / max_next * 0.5 + follower * 0.5
        });

        Self { scores }
    }
}

fn window_set(draws: &[HistoricalDraw]) -> BTreeSet<u8> {
    draws
        .iter()
        .flat_map(|d| d.numbers.numbers().iter().copied())
        .collect()
}

/// Jaccard-weighted votes for the draws that followed windows resembling the
/// latest `LOOKBACK` draws.
fn similar_window_followers(history: &DrawHistory) -> [f64; CANDIDATE_COUNT] {
    let draws = history.draws();
    let recent = window_set(history.tail(LOOKBACK));
    let mut votes = [0.0f64; CANDIDATE_COUNT];

    for i in LOOKBACK..draws.len().saturating_sub(1) {
        let window = window_set(&draws[i - LOOKBACK..i]);
        let union = recent.union(&window).count();
        if union == 0 {
            continue;
        }
        let similarity = recent.intersection(&window).count() as f64 / union as f64;
        if similarity > SIMILARITY_THRESHOLD {
            for n in draws[i].numbers.numbers() {
                votes[(*n - 1) as usize] += similarity;
            }
        }
    }

    let total: f64 = votes.iter().sum();
    if total > 0.0 {
        votes.iter_mut().for_each(|v| *v /= total);
    }
    votes
}

/// Candidates most often drawn right after the last draw's members, best first.
fn likely_followers(history: &DrawHistory) -> Vec<u8> {
    let draws = history.draws();
    let mut follows = vec![[0usize; CANDIDATE_COUNT]; CANDIDATE_COUNT];
    for pair in draws.windows(2) {
        for current in pair[0].numbers.numbers() {
            for next in pair[1].numbers.numbers() {
                follows[(*current - 1) as usize][(*next - 1) as usize] += 1;
            }
        }
    }

    let mut points = [0usize; CANDIDATE_COUNT];
    if let Some(last) = history.last() {
        for n in last.numbers.numbers() {
            let row = &follows[(*n - 1) as usize];
            let mut ranked: Vec<usize> = (0..CANDIDATE_COUNT).filter(|i| row[*i] > 0).collect();
            ranked.sort_by(|a, b| row[*b].cmp(&row[*a]).then(a.cmp(b)));
            for (rank, idx) in ranked.iter().take(FOLLOWERS_PER_NUMBER).enumerate() {
                points[*idx] += FOLLOWERS_PER_NUMBER - rank;
            }
        }
    }

    let mut ranked: Vec<usize> = (0..CANDIDATE_COUNT).filter(|i| points[*i] > 0).collect();
    ranked.sort_by(|a, b| points[*b].cmp(&points[*a]).then(a.cmp(b)));
    ranked
        .into_iter()
        .take(FOLLOWER_LIST)
        .map(|idx| idx as u8 + 1)
        .collect()
}

impl ScoringEngine for SequenceEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Ok(self.scores.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::scoring::heuristics::fixtures::{assert_unit_range, random_history};

    #[test]
    fn test_followers_of_repeating_pattern() {
        let history = DrawHistory::from_rows(vec![
            (1, [1, 2, 3, 4, 5, 6]),
            (2, [7, 8, 9, 10, 11, 12]),
            (3, [1, 2, 3, 4, 5, 6]),
        ])
        .unwrap();
        let followers = likely_followers(&history);
        assert_eq!(followers[..6], [7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_scores_bounded() {
        let history = random_history(120, 21);
        let scores = SequenceEngine::new(&history).scores().unwrap();
        assert_unit_range(&scores);
    }
}
