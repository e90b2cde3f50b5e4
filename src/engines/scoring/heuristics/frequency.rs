use super::{appearances, mean, occurrences, positive_max, NEUTRAL_SCORE};
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::{ScoreVector, MAX_CANDIDATE, MIN_CANDIDATE};
use serde::Serialize;

const RECENT_WINDOW: usize = 30;
const MID_WINDOW: usize = 100;

/// Recent and mid-term frequency blended with an overdue signal.
pub struct FrequencyEngine {
    scores: ScoreVector,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotColdSummary {
    /// (candidate, appearances) over the window, most frequent first
    pub hot: Vec<(u8, usize)>,
    pub cold: Vec<(u8, usize)>,
    /// (candidate, rounds since last seen / mean gap), most overdue first
    pub overdue: Vec<(u8, f64)>,
}

impl FrequencyEngine {
    pub const ID: &'static str = "frequency";

    pub fn new(history: &DrawHistory) -> Self {
        if history.is_empty() {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
            };
        }

        let recent = occurrences(history.tail(RECENT_WINDOW));
        let mid = occurrences(history.tail(MID_WINDOW));
        let max_recent = positive_max(recent.iter().map(|c| *c as f64));
        let max_mid = positive_max(mid.iter().map(|c| *c as f64));

        let scores = ScoreVector::from_fn(|c| {
            let idx = (c - 1) as usize;
            let delay = match delay_ratio(history, c) {
                Some(r) if r >= 2.0 => 1.0,
                Some(r) if r >= 1.5 => 0.8,
                Some(r) if r >= 1.0 => 0.5,
                Some(r) => r * 0.3,
                None => 0.3,
            };
            recent[idx] as f64 / max_recent * 0.35 + mid[idx] as f64 / max_mid * 0.15 + delay * 0.50
        });

        Self { scores }
    }

    /// Hot, cold, and overdue candidates over the trailing `window` draws.
    pub fn hot_cold(history: &DrawHistory, window: usize, top_k: usize) -> HotColdSummary {
        let counts = occurrences(history.tail(window));
        let mut by_count: Vec<(u8, usize)> = (MIN_CANDIDATE..=MAX_CANDIDATE)
            .map(|c| (c, counts[(c - 1) as usize]))
            .collect();

        by_count.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let hot = by_count.iter().take(top_k).copied().collect();
        by_count.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        let cold = by_count.iter().take(top_k).copied().collect();

        let mut overdue: Vec<(u8, f64)> = (MIN_CANDIDATE..=MAX_CANDIDATE)
            .filter_map(|c| delay_ratio(history, c).map(|r| (c, r)))
            .filter(|(_, r)| *r >= 1.5)
            .collect();
        overdue.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        overdue.truncate(top_k);

        HotColdSummary { hot, cold, overdue }
    }
}

/// Rounds since last appearance over the mean gap between appearances.
/// `None` when the candidate has fewer than two appearances.
fn delay_ratio(history: &DrawHistory, candidate: u8) -> Option<f64> {
    let seen = appearances(history.draws(), candidate);
    match seen.last() {
        None => Some(0.0),
        Some(last) => {
            let gaps: Vec<f64> = seen.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
            let avg_gap = mean(&gaps)?;
            let last_seen = (history.len() - 1 - last) as f64;
            Some(last_seen / avg_gap)
        }
    }
}

impl ScoringEngine for FrequencyEngine {
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
    use crate::engines::scoring::heuristics::fixtures::random_history;

    #[test]
    fn test_scores_cover_universe() {
        let history = random_history(150, 3);
        let scores = FrequencyEngine::new(&history).scores().unwrap();
        assert_eq!(scores.values().len(), 45);
        assert!(scores.min() >= 0.0);
    }

    #[test]
    fn test_empty_history_is_neutral() {
        let history = DrawHistory::new(Vec::new()).unwrap();
        let scores = FrequencyEngine::new(&history).scores().unwrap();
        assert_eq!(scores, ScoreVector::uniform(NEUTRAL_SCORE));
    }

    #[test]
    fn test_hot_cold_summary() {
        let history = DrawHistory::from_rows(vec![
            (1, [1, 2, 3, 4, 5, 6]),
            (2, [1, 2, 3, 4, 5, 7]),
            (3, [1, 2, 3, 4, 8, 9]),
        ])
        .unwrap();
        let summary = FrequencyEngine::hot_cold(&history, 50, 3);
        assert_eq!(summary.hot, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(summary.cold[0], (10, 0));
    }
}
