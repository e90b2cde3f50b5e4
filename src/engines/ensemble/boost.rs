use crate::data::DrawHistory;
use crate::engines::scoring::EngineRegistry;
use crate::types::{EngineId, PICK_COUNT};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Largest extra weight an engine can earn: the best performer gets 1.3.
pub const BOOST_SPAN: f64 = 0.3;
/// History beyond the lookback needed before boosts are computed.
pub const BOOST_MIN_TRAINING: usize = 50;

/// Multiplicative weight factor per engine from its solo hits over the most
/// recent `lookback` rounds.
///
/// Each round is replayed on the history strictly before it. Engines in
/// `excluded`, engines that fail, and every engine when history is shorter
/// than `lookback + BOOST_MIN_TRAINING` keep a factor of 1.0.
pub fn compute_boost(
    registry: &EngineRegistry,
    history: &DrawHistory,
    engine_ids: &[EngineId],
    lookback: usize,
    excluded: &[String],
) -> BTreeMap<EngineId, f64> {
    let neutral: BTreeMap<EngineId, f64> = engine_ids.iter().map(|id| (id.clone(), 1.0)).collect();
    if lookback == 0 || history.len() < lookback + BOOST_MIN_TRAINING {
        log::debug!(
            "Dynamic boost skipped: {} rounds, {} required",
            history.len(),
            lookback + BOOST_MIN_TRAINING
        );
        return neutral;
    }

    let scored: Vec<&EngineId> = engine_ids.iter().filter(|id| !excluded.contains(id)).collect();
    let end = history.len();

    let per_round: Vec<BTreeMap<&EngineId, usize>> = (end - lookback..end)
        .into_par_iter()
        .map(|index| {
            let training = history.prefix(index);
            let mut hits = BTreeMap::new();
            let Some(actual) = history.get(index) else {
                return hits;
            };
            for id in &scored {
                let prediction = match registry.instantiate_one(id, &training) {
                    Some(Ok(engine)) => engine.predict(PICK_COUNT),
                    Some(Err(e)) => Err(e),
                    None => continue,
                };
                match prediction {
                    Ok(numbers) => {
                        let count = numbers.iter().filter(|n| actual.numbers.contains(**n)).count();
                        hits.insert(*id, count);
                    }
                    Err(e) => {
                        log::debug!("Boost replay of {} at index {} failed: {}", id, index, e)
                    }
                }
            }
            hits
        })
        .collect();

    let mut totals: BTreeMap<&EngineId, usize> = BTreeMap::new();
    for round in per_round {
        for (id, hits) in round {
            *totals.entry(id).or_insert(0) += hits;
        }
    }

    let max_hits = totals.values().copied().max().unwrap_or(0);
    if max_hits == 0 {
        return neutral;
    }

    let mut boosts = neutral;
    for (id, hits) in totals {
        boosts.insert(id.clone(), 1.0 + hits as f64 / max_hits as f64 * BOOST_SPAN);
    }
    log::debug!("Dynamic boosts: {:?}", boosts);
    boosts
}
