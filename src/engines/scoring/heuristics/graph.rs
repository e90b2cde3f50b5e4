use super::{occurrences, positive_max, NEUTRAL_SCORE};
use crate::data::DrawHistory;
use crate::engines::scoring::ScoringEngine;
use crate::types::{ScoreVector, CANDIDATE_COUNT};
use ndarray::{Array2, Axis};

const RECENT_WINDOW: usize = 30;
const PARTNERS: usize = 10;

/// Co-occurrence graph: degree centrality plus the recent activity of each
/// candidate's strongest partners.
pub struct GraphEngine {
    scores: ScoreVector,
}

impl GraphEngine {
    pub const ID: &'static str = "graph";

    pub fn new(history: &DrawHistory) -> Self {
        if history.is_empty() {
            return Self {
                scores: ScoreVector::uniform(NEUTRAL_SCORE),
            };
        }

        let matrix = cooccurrence(history);
        let recent = occurrences(history.tail(RECENT_WINDOW));

        let centrality: Vec<f64> = matrix
            .axis_iter(Axis(0))
            .map(|row| {
                let total: u32 = row.sum();
                let connected = row.iter().filter(|c| **c > 0).count();
                total as f64 * (connected as f64 / (CANDIDATE_COUNT - 1) as f64)
            })
            .collect();
        let max_centrality = positive_max(centrality.iter().copied());

        let partner: Vec<f64> = (0..CANDIDATE_COUNT)
            .map(|idx| {
                let mut partners: Vec<(usize, u32)> = (0..CANDIDATE_COUNT)
                    .filter(|other| *other != idx)
                    .map(|other| (other, matrix[[idx, other]]))
                    .collect();
                partners.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
                partners
                    .iter()
                    .take(PARTNERS)
                    .map(|(other, count)| recent[*other] as f64 * *count as f64)
                    .sum()
            })
            .collect();
        let max_partner = positive_max(partner.iter().copied());

        let scores = ScoreVector::from_fn(|c| {
            let idx = (c - 1) as usize;
            centrality[idx] / max_centrality * 0.5 + partner[idx] / max_partner * 0.5
        });

        Self { scores }
    }
}

/// Symmetric pair counts, zero diagonal.
fn cooccurrence(history: &DrawHistory) -> Array2<u32> {
    let mut matrix = Array2::<u32>::zeros((CANDIDATE_COUNT, CANDIDATE_COUNT));
    for draw in history.iter() {
        let numbers = draw.numbers.numbers();
        for (i, a) in numbers.iter().enumerate() {
            for b in &numbers[i + 1..] {
                let (a, b) = ((*a - 1) as usize, (*b - 1) as usize);
                matrix[[a, b]] += 1;
                matrix[[b, a]] += 1;
            }
        }
    }
    matrix
}

impl ScoringEngine for GraphEngine {
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
    fn test_cooccurrence_is_symmetric() {
        let history = random_history(40, 5);
        let matrix = cooccurrence(&history);
        assert_eq!(matrix, matrix.t());
        assert_eq!(matrix.sum(), 40 * 30);
    }

    #[test]
    fn test_frequent_pair_scores_high() {
        let history = DrawHistory::from_rows(vec![
            (1, [1, 2, 3, 4, 5, 6]),
            (2, [1, 2, 10, 11, 12, 13]),
            (3, [1, 2, 20, 21, 22, 23]),
        ])
        .unwrap();
        let scores = GraphEngine::new(&history).scores().unwrap();
        assert_unit_range(&scores);
        assert_eq!(scores.get(1), 1.0);
        assert_eq!(scores.get(45), 0.0);
    }
}
