use super::{positive_max, NEUTRAL_SCORE};
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::{ScoreVector, CANDIDATE_COUNT};
use ndarray::Array2;

/// First-order transitions between consecutive draws, blended with how
/// unusual each candidate's current absence streak is.
pub struct TransitionEngine {
    scores: ScoreVector,
}

impl TransitionEngine {
    pub const ID: &'static str = "transition";

    pub fn new(history: &DrawHistory) -> Self {
        let Some(last) = history.last() else {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
            };
        };

        let transitions = transition_probabilities(history);
        let mut markov = [0.0f64; CANDIDATE_COUNT];
        for from in last.numbers.numbers() {
            let row = transitions.row((*from - 1) as usize);
            for (to, p) in row.iter().enumerate() {
                markov[to] += p;
            }
        }
        let max_markov = positive_max(markov.iter().copied());

        let scores = ScoreVector::from_fn(|c| {
            markov[(c - 1) as usize] / max_markov * 0.5 + skip_survival(history, c) * 0.5
        });

        Self { scores }
    }
}

/// Row-normalized counts of `from` in draw i followed by `to` in draw i+1.
fn transition_probabilities(history: &DrawHistory) -> Array2<f64> {
    let mut counts = Array2::<f64>::zeros((CANDIDATE_COUNT, CANDIDATE_COUNT));
    for pair in history.draws().windows(2) {
        for from in pair[0].numbers.numbers() {
            for to in pair[1].numbers.numbers() {
                counts[[(*from - 1) as usize, (*to - 1) as usize]] += 1.0;
            }
        }
    }
    for mut row in counts.rows_mut() {
        let total = row.sum();
        if total > 0.0 {
            row /= total;
        }
    }
    counts
}

/// Share of past absence streaks at least as long as the current one.
fn skip_survival(history: &DrawHistory, candidate: u8) -> f64 {
    let mut streaks = Vec::new();
    let mut skip = 0usize;
    for draw in history.iter() {
        if draw.numbers.contains(candidate) {
            streaks.push(skip);
            skip = 0;
        } else {
            skip += 1;
        }
    }
    if streaks.is_empty() {
        return NEUTRAL_SCORE;
    }
    let current = skip;
    streaks.iter().filter(|s| **s >= current).count() as f64 / streaks.len() as f64
}

impl ScoringEngine for TransitionEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Ok(self.scores.clone())
    }
}
