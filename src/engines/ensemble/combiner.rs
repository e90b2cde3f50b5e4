use crate::types::{
    is_candidate, EngineId, HistoricalDraw, ScoreVector, WeightVector, CANDIDATE_COUNT,
};
use std::collections::BTreeMap;

pub const WEIGHTED_SHARE: f64 = 0.55;
pub const VOTE_SHARE: f64 = 0.30;
pub const REPEAT_BONUS: f64 = 0.15;

/// Merge engine outputs into one ranking, scaled so the best candidate is 1.0.
///
/// Weights are renormalized over the engines present in `engine_scores`;
/// engines absent from `weights` contribute nothing unless every present
/// weight is zero, in which case the present engines are averaged equally.
/// With no engine output at all the result is uniform.
pub fn combine(
    engine_scores: &BTreeMap<EngineId, ScoreVector>,
    engine_predictions: &BTreeMap<EngineId, Vec<u8>>,
    weights: &WeightVector,
    last_draw: Option<&HistoricalDraw>,
) -> ScoreVector {
    if engine_scores.is_empty() && engine_predictions.is_empty() {
        return ScoreVector::uniform(1.0);
    }

    let mut ensemble = ScoreVector::zeros();

    let present_total: f64 = engine_scores
        .keys()
        .map(|id| weights.get(id).unwrap_or(0.0))
        .sum();
    for (id, scores) in engine_scores {
        let share = if present_total > 0.0 {
            weights.get(id).unwrap_or(0.0) / present_total
        } else {
            1.0 / engine_scores.len() as f64
        };
        if share == 0.0 {
            continue;
        }
        for (candidate, score) in scores.iter() {
            ensemble.add(candidate, score * share * WEIGHTED_SHARE);
        }
    }

    let mut votes = [0usize; CANDIDATE_COUNT];
    for prediction in engine_predictions.values() {
        for candidate in prediction.iter().filter(|c| is_candidate(**c)) {
            votes[(*candidate - 1) as usize] += 1;
        }
    }
    let max_votes = votes.iter().copied().max().unwrap_or(0);
    if max_votes > 0 {
        for (idx, count) in votes.iter().enumerate() {
            ensemble.add(idx as u8 + 1, *count as f64 / max_votes as f64 * VOTE_SHARE);
        }
    }

    if let Some(draw) = last_draw {
        for candidate in draw.numbers.numbers() {
            ensemble.add(*candidate, REPEAT_BONUS);
        }
    }

    if ensemble.max() > 0.0 {
        ensemble.normalized_by_max()
    } else {
        ScoreVector::uniform(1.0)
    }
}
