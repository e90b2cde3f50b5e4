use crate::data::DrawHistory;
use crate::engines::scoring::EngineRegistry;
use crate::error::{EnsembleError, Result};
use crate::types::{EngineId, HitHistogram, WeightVector, CANDIDATE_COUNT, PICK_COUNT};
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use std::time::Instant;

/// Score written for an engine that could not score a cached round.
const FALLBACK_SCORE: f64 = 0.5;

/// Outcome of evaluating one weight vector over the cached window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub mean_hits: f64,
    pub histogram: HitHistogram,
}

/// Every engine's score vector for each round of a trailing window, plus the
/// actual draws, so weight vectors can be evaluated without running engines.
///
/// `scores` is `[round, engine, candidate]`, `actual` is `[round, candidate]`
/// with 1 marking a drawn candidate. Rounds are in chronological order.
#[derive(Debug, Clone)]
pub struct CachedEvaluation {
    engine_names: Vec<EngineId>,
    rounds: Vec<u32>,
    scores: Array3<f64>,
    actual: Array2<u8>,
}

impl CachedEvaluation {
    /// Score the last `test_window` rounds, each on the history strictly before it.
    pub fn precompute(
        registry: &EngineRegistry,
        history: &DrawHistory,
        test_window: usize,
        min_training_rounds: usize,
    ) -> Result<Self> {
        if registry.is_empty() {
            return Err(EnsembleError::Configuration(
                "no scoring engines registered".to_string(),
            ));
        }
        if test_window == 0 {
            return Err(EnsembleError::Configuration(
                "test window must cover at least one round".to_string(),
            ));
        }
        history.require(test_window + min_training_rounds)?;

        let mut engine_names: Vec<EngineId> =
            registry.ids().into_iter().map(String::from).collect();
        engine_names.sort();
        let engine_count = engine_names.len();
        let first = history.len() - test_window;

        log::info!(
            "Building evaluation cache: {} rounds x {} engines",
            test_window,
            engine_count
        );
        let started = Instant::now();

        let rows: Vec<(u32, Vec<f64>, Vec<u8>)> = (first..history.len())
            .into_par_iter()
            .map(|index| {
                let training = history.prefix(index);
                let mut scores = Vec::with_capacity(engine_count * CANDIDATE_COUNT);
                for name in &engine_names {
                    let row = match registry.instantiate_one(name, &training) {
                        Some(Ok(engine)) => engine.scores(),
                        Some(Err(e)) => Err(e),
                        None => Err(anyhow::anyhow!("not registered")),
                    };
                    match row {
                        Ok(row) => scores.extend_from_slice(row.values()),
                        Err(e) => {
                            log::warn!("Engine {} failed at index {}: {}", name, index, e);
                            scores.extend(std::iter::repeat(FALLBACK_SCORE).take(CANDIDATE_COUNT));
                        }
                    }
                }

                let mut actual = vec![0u8; CANDIDATE_COUNT];
                let mut round = 0;
                if let Some(draw) = history.get(index) {
                    round = draw.round;
                    for n in draw.numbers.numbers() {
                        actual[(*n - 1) as usize] = 1;
                    }
                }
                log::debug!("Cached round {}", round);
                (round, scores, actual)
            })
            .collect();

        let mut rounds = Vec::with_capacity(test_window);
        let mut flat_scores = Vec::with_capacity(test_window * engine_count * CANDIDATE_COUNT);
        let mut flat_actual = Vec::with_capacity(test_window * CANDIDATE_COUNT);
        for (round, scores, actual) in rows {
            rounds.push(round);
            flat_scores.extend(scores);
            flat_actual.extend(actual);
        }

        log::info!("Evaluation cache ready in {:.2?}", started.elapsed());
        Self::from_parts(
            engine_names,
            rounds,
            Array3::from_shape_vec((test_window, engine_count, CANDIDATE_COUNT), flat_scores)
                .map_err(|e| EnsembleError::WorkerFailure(format!("cache shape: {}", e)))?,
            Array2::from_shape_vec((test_window, CANDIDATE_COUNT), flat_actual)
                .map_err(|e| EnsembleError::WorkerFailure(format!("cache shape: {}", e)))?,
        )
    }

    /// Assemble a cache from precomputed tensors, checking their shapes agree.
    pub fn from_parts(
        engine_names: Vec<EngineId>,
        rounds: Vec<u32>,
        scores: Array3<f64>,
        actual: Array2<u8>,
    ) -> Result<Self> {
        let (round_count, engine_count, candidates) = scores.dim();
        if engine_count != engine_names.len()
            || candidates != CANDIDATE_COUNT
            || actual.dim() != (round_count, CANDIDATE_COUNT)
            || rounds.len() != round_count
        {
            return Err(EnsembleError::Configuration(format!(
                "inconsistent cache shapes: scores {:?}, actual {:?}, {} engines, {} rounds",
                scores.dim(),
                actual.dim(),
                engine_names.len(),
                rounds.len()
            )));
        }
        Ok(Self {
            engine_names,
            rounds,
            scores,
            actual,
        })
    }

    pub fn engine_names(&self) -> &[EngineId] {
        &self.engine_names
    }

    pub fn rounds(&self) -> &[u32] {
        &self.rounds
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn scores(&self) -> &Array3<f64> {
        &self.scores
    }

    pub fn actual(&self) -> &Array2<u8> {
        &self.actual
    }

    /// Mean hits of the weighted top six per round. Pure: identical inputs
    /// give bit-identical output.
    ///
    /// Weights are normalized over the cached engines with positive weight.
    /// Top-six ties go to the lower candidate.
    pub fn evaluate(&self, weights: &WeightVector) -> Evaluation {
        let total: f64 = self
            .engine_names
            .iter()
            .filter_map(|name| weights.get(name))
            .filter(|w| *w > 0.0)
            .sum();
        let mut histogram = HitHistogram::default();
        if total <= 0.0 || self.is_empty() {
            return Evaluation {
                mean_hits: 0.0,
                histogram,
            };
        }

        let w: Array1<f64> = self
            .engine_names
            .iter()
            .map(|name| weights.get(name).unwrap_or(0.0) / total)
            .collect();

        for (round_scores, actual) in self
            .scores
            .axis_iter(Axis(0))
            .zip(self.actual.axis_iter(Axis(0)))
        {
            let combined = combine_round(&w, round_scores);
            let hits = top_candidates(&combined)
                .iter()
                .filter(|idx| actual[**idx] == 1)
                .count();
            histogram.record(hits);
        }

        Evaluation {
            mean_hits: histogram.mean(),
            histogram,
        }
    }
}

/// Weighted sum along the engine axis.
fn combine_round(weights: &Array1<f64>, round_scores: ArrayView2<f64>) -> Array1<f64> {
    weights.dot(&round_scores)
}

fn top_candidates(combined: &Array1<f64>) -> [usize; PICK_COUNT] {
    let mut order: Vec<usize> = (0..combined.len()).collect();
    order.sort_by(|a, b| combined[*b].total_cmp(&combined[*a]).then(a.cmp(b)));
    let mut top = [0usize; PICK_COUNT];
    top.copy_from_slice(&order[..PICK_COUNT]);
    top
}
