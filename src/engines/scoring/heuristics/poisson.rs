use super::{occurrences, NEUTRAL_SCORE};
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::ScoreVector;

const WINDOW: usize = 50;
const ABSENCE_WINDOW: usize = 10;
const ABSENCE_BONUS: f64 = 0.1;

/// Rebound score: candidates seen less often in the recent window than their
/// long-run rate predicts score higher.
pub struct PoissonEngine {
    scores: ScoreVector,
}

impl PoissonEngine {
    pub const ID: &'static str = "poisson";

    pub fn new(history: &DrawHistory) -> Self {
        let total = history.len();
        if total == 0 {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
            };
        }

        let window = WINDOW.min(total);
        let long_run = occurrences(history.draws());
        let recent = occurrences(history.tail(window));
        let absent = occurrences(history.tail(ABSENCE_WINDOW));

        let scores = ScoreVector::from_fn(|c| {
            let idx = (c - 1) as usize;
            let expected_rate = long_run[idx] as f64 / total as f64;
            let mu = expected_rate * window as f64;
            if mu <= 0.0 {
                return NEUTRAL_SCORE;
            }
            let mut score = (1.0 - poisson_cdf(recent[idx], mu)).clamp(0.1, 0.9);
            if absent[idx] == 0 {
                score += ABSENCE_BONUS;
            }
            score
        });

        Self { scores }
    }
}

/// P(X <= k) for X ~ Poisson(mu).
fn poisson_cdf(k: usize, mu: f64) -> f64 {
    let mut pmf = (-mu).exp();
    let mut cdf = pmf;
    for i in 1..=k {
        pmf *= mu / i as f64;
        cdf += pmf;
    }
    cdf.min(1.0)
}

impl ScoringEngine for PoissonEngine {
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
    fn test_cdf_matches_closed_form() {
        let mu: f64 = 2.0;
        let expected = (-mu).exp() * (1.0 + mu + mu * mu / 2.0);
        assert!((poisson_cdf(2, mu) - expected).abs() < 1e-12);
        assert!((poisson_cdf(200, mu) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_scores_bounded() {
        let history = random_history(120, 9);
        let scores = PoissonEngine::new(&history).scores().unwrap();
        assert_unit_range(&scores);
        assert!(scores.min() >= 0.1);
    }
}
