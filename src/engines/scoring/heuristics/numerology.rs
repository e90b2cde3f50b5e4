use super::NEUTRAL_SCORE;
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::{ScoreVector, PICK_COUNT};
use std::collections::HashMap;

const PRIMES: [u8; 14] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43];
const SQUARES: [u8; 6] = [1, 4, 9, 16, 25, 36];
const SUM_WINDOW: usize = 30;
/// Distance from the recent per-pick mean at which proximity reaches zero.
const PROXIMITY_SPAN: f64 = 20.0;
/// Share assumed for a digit sum that never appeared.
const UNSEEN_DIGIT_SUM: f64 = 0.05;

fn digit_sum(n: u8) -> u8 {
    n / 10 + n % 10
}

/// Number-property heuristic: primes, squares, digit sums, and closeness to
/// the recent mean pick.
pub struct NumerologyEngine {
    scores: ScoreVector,
}

impl NumerologyEngine {
    pub const ID: &'static str = "numerology";

    pub fn new(history: &DrawHistory) -> Self {
        if history.is_empty() {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
            };
        }

        let mut prime_counts = [0usize; PICK_COUNT + 1];
        let mut digit_sums: HashMap<u8, usize> = HashMap::new();
        for draw in history.iter() {
            let numbers = draw.numbers.numbers();
            prime_counts[numbers.iter().filter(|n| PRIMES.contains(n)).count()] += 1;
            for n in numbers {
                *digit_sums.entry(digit_sum(*n)).or_default() += 1;
            }
        }
        // Most common prime count per draw; ties go to the smaller count.
        let typical_primes = (0..=PICK_COUNT)
            .max_by(|a, b| prime_counts[*a].cmp(&prime_counts[*b]).then(b.cmp(a)))
            .unwrap_or(2);
        let picks = (history.len() * PICK_COUNT) as f64;

        let recent = history.tail(SUM_WINDOW);
        let recent_mean_pick = recent.iter().map(|d| d.numbers.sum() as f64).sum::<f64>()
            / (recent.len() * PICK_COUNT) as f64;

        let scores = ScoreVector::from_fn(|c| {
            let prime = if PRIMES.contains(&c) && typical_primes >= 2 {
                0.25
            } else {
                0.15
            };
            let square = if SQUARES.contains(&c) { 0.15 } else { 0.1 };
            let share = digit_sums
                .get(&digit_sum(c))
                .map(|count| *count as f64 / picks)
                .unwrap_or(UNSEEN_DIGIT_SUM);
            let proximity = (1.0 - (c as f64 - recent_mean_pick).abs() / PROXIMITY_SPAN).max(0.0);
            (prime + square + share * 3.0 + proximity * 0.3).min(1.0)
        });

        Self { scores }
    }
}

impl ScoringEngine for NumerologyEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Ok(self.scores.clone())
    }
}
