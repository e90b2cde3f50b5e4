use super::boost::compute_boost;
use super::combiner::combine;
use crate::config::{EnsembleConfig, SelectionConfig};
use crate::data::DrawHistory;
use crate::engines::combination::{
    CombinationOptimizer, CombinationValidator, SumRange, ValidationReport,
};
use crate::engines::scoring::heuristics::{FrequencyEngine, HotColdSummary};
use crate::engines::scoring::{EngineRegistry, ScoringEngine};
use crate::error::{EnsembleError, Result};
use crate::types::{CandidateSubset, EngineId, ScoreVector, WeightVector, PICK_COUNT};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// Sum distance at which the confidence sum term reaches zero.
const CONFIDENCE_SUM_TOLERANCE: f64 = 50.0;
const REPEAT_SET_POOL: usize = 15;
const REPEAT_SET_CARRIED: usize = 2;
const SAMPLE_ATTEMPTS: usize = 100;
/// After this many attempts an invalid but novel sample is accepted.
const ACCEPT_INVALID_AFTER: usize = 50;
const HOT_COLD_WINDOW: usize = 50;
const HOT_COLD_TOP: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub numbers: CandidateSubset,
    /// 0..=100
    pub confidence: f64,
    /// Composite selection score, or validator score for sampled sets
    pub quality: f64,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnsembleReport {
    pub draws_analysed: usize,
    pub last_round: Option<u32>,
    pub engine_predictions: BTreeMap<EngineId, Vec<u8>>,
    pub failed_engines: BTreeMap<EngineId, String>,
    pub weights: WeightVector,
    pub boosts: BTreeMap<EngineId, f64>,
    pub ensemble_scores: ScoreVector,
    pub predictions: Vec<Prediction>,
    pub sum_range: SumRange,
    pub top_validation: Option<ValidationReport>,
    pub hot_cold: HotColdSummary,
    pub repeat_analysis: Option<RepeatSummary>,
}

/// How much of one draw tends to carry into the next.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatSummary {
    pub last_draw: Vec<u8>,
    /// Mean numbers shared by consecutive draws
    pub mean_carried: f64,
    /// Consecutive pairs per shared count; index is the count
    pub carried_histogram: Vec<usize>,
    /// Last-draw numbers by ensemble score, best first
    pub ranked_repeats: Vec<(u8, f64)>,
}

/// Engines, weights, and ensemble scores for one history snapshot.
///
/// Everything is computed at construction; prediction methods only read.
pub struct EnsemblePredictor {
    history: DrawHistory,
    engines: Vec<(EngineId, Box<dyn ScoringEngine>)>,
    failed_engines: BTreeMap<EngineId, String>,
    boosts: BTreeMap<EngineId, f64>,
    weights: WeightVector,
    engine_scores: BTreeMap<EngineId, ScoreVector>,
    engine_predictions: BTreeMap<EngineId, Vec<u8>>,
    ensemble_scores: ScoreVector,
    ranked: Vec<(u8, f64)>,
    optimizer: CombinationOptimizer,
    candidate_pool: usize,
}

impl EnsemblePredictor {
    pub fn new(
        registry: &EngineRegistry,
        history: &DrawHistory,
        config: &EnsembleConfig,
        selection: &SelectionConfig,
    ) -> Result<Self> {
        history.require(1)?;

        let registry = match &config.enabled_engines {
            Some(ids) => registry.filtered(ids),
            None => registry.clone(),
        };

        let mut engines = Vec::new();
        let mut failed_engines = BTreeMap::new();
        let mut engine_scores = BTreeMap::new();
        let mut engine_predictions = BTreeMap::new();
        for (id, built) in registry.instantiate(history) {
            let engine = match built {
                Ok(engine) => engine,
                Err(e) => {
                    isolate(&mut failed_engines, &id, "initialise", e);
                    continue;
                }
            };
            match engine.scores() {
                Ok(scores) => {
                    engine_scores.insert(id.clone(), scores);
                }
                Err(e) => {
                    isolate(&mut failed_engines, &id, "score", e);
                    continue;
                }
            }
            let prediction = engine.predict(PICK_COUNT).and_then(|numbers| {
                CandidateSubset::new(&numbers)?;
                Ok(numbers)
            });
            match prediction {
                Ok(numbers) => {
                    engine_predictions.insert(id.clone(), numbers);
                }
                Err(e) => isolate(&mut failed_engines, &id, "predict", e),
            }
            engines.push((id, engine));
        }
        let ids: Vec<EngineId> = engines.iter().map(|(id, _)| id.clone()).collect();

        let boosts = if config.use_dynamic_boost {
            compute_boost(
                &registry,
                history,
                &ids,
                config.boost_lookback,
                &config.boost_excluded_engines,
            )
        } else {
            ids.iter().map(|id| (id.clone(), 1.0)).collect()
        };

        let base = config.default_weights.restricted_to(ids.iter().map(String::as_str));
        let weights: WeightVector = base
            .iter()
            .map(|(id, w)| (id, w * boosts.get(id).copied().unwrap_or(1.0)))
            .collect::<WeightVector>()
            .normalized();

        let ensemble_scores =
            combine(&engine_scores, &engine_predictions, &weights, history.last());
        let ranked = ensemble_scores.ranked();

        let validator = config.use_validator.then(CombinationValidator::new);
        let optimizer = CombinationOptimizer::new(
            validator,
            SumRange::from_history(history),
            selection.candidate_pool,
        );

        log::info!(
            "Ensemble built on {} draws with {} engines ({} failed)",
            history.len(),
            engines.len(),
            failed_engines.len()
        );

        Ok(Self {
            history: history.clone(),
            engines,
            failed_engines,
            boosts,
            weights,
            engine_scores,
            engine_predictions,
            ensemble_scores,
            ranked,
            optimizer,
            candidate_pool: selection.candidate_pool,
        })
    }

    pub fn engine_ids(&self) -> Vec<&str> {
        self.engines.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn boosts(&self) -> &BTreeMap<EngineId, f64> {
        &self.boosts
    }

    pub fn engine_scores(&self) -> &BTreeMap<EngineId, ScoreVector> {
        &self.engine_scores
    }

    pub fn engine_predictions(&self) -> &BTreeMap<EngineId, Vec<u8>> {
        &self.engine_predictions
    }

    pub fn failed_engines(&self) -> &BTreeMap<EngineId, String> {
        &self.failed_engines
    }

    pub fn ensemble_scores(&self) -> &ScoreVector {
        &self.ensemble_scores
    }

    pub fn sum_range(&self) -> SumRange {
        self.optimizer.sum_range()
    }

    /// Confidence in 0..=100: engine agreement 40%, sum fit 25, validator 35.
    pub fn confidence(&self, numbers: &CandidateSubset) -> f64 {
        let engine_count = self.engines.len();
        let engine_confidence = if engine_count == 0 {
            0.0
        } else {
            let recommendations: usize = numbers
                .as_slice()
                .iter()
                .map(|n| {
                    self.engine_predictions
                        .values()
                        .filter(|p| p.contains(n))
                        .count()
                })
                .sum();
            recommendations as f64 / PICK_COUNT as f64 / engine_count as f64 * 100.0
        };
        let sum_fit = self.sum_range().fit(numbers.sum(), CONFIDENCE_SUM_TOLERANCE);
        let quality = self.quality(numbers);

        (engine_confidence * 0.4 + sum_fit * 25.0 + quality * 35.0).min(100.0)
    }

    fn quality(&self, numbers: &CandidateSubset) -> f64 {
        self.optimizer
            .validator()
            .map_or(0.5, |v| v.score(numbers.as_slice()))
    }

    fn is_valid(&self, numbers: &CandidateSubset) -> bool {
        self.optimizer
            .validator()
            .map_or(true, |v| v.is_valid(numbers.as_slice()))
    }

    pub fn predict_single(&self) -> Result<Prediction> {
        let selection = self.optimizer.select(&self.ranked)?;
        Ok(Prediction {
            confidence: self.confidence(&selection.subset),
            numbers: selection.subset,
            quality: selection.score,
            valid: selection.valid,
        })
    }

    /// Up to `count` distinct sets, highest confidence first.
    ///
    /// The first set is the optimizer's pick, the second carries two
    /// candidates of the last draw, the rest are score-weighted samples.
    pub fn predict_sets(&self, count: usize) -> Result<Vec<Prediction>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut predictions = vec![self.predict_single()?];
        let mut used: BTreeSet<CandidateSubset> = predictions.iter().map(|p| p.numbers).collect();

        for set_index in 1..count {
            let mut rng = StdRng::seed_from_u64(set_index as u64 * 42 + 7);
            let candidate = if set_index == 1 {
                self.repeat_set(&mut rng)
            } else {
                self.sampled_set(&mut rng, &used)
            };
            let Some(mut candidate) = candidate else {
                continue;
            };
            if !self.is_valid(&candidate) {
                candidate = self.optimizer.repair(&candidate);
            }
            if used.insert(candidate) {
                predictions.push(Prediction {
                    confidence: self.confidence(&candidate),
                    quality: self.quality(&candidate),
                    valid: self.is_valid(&candidate),
                    numbers: candidate,
                });
            }
        }

        predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(predictions)
    }

    fn repeat_set(&self, rng: &mut StdRng) -> Option<CandidateSubset> {
        let last = self.history.last()?;
        let mut numbers: Vec<u8> = last.numbers.as_slice()[..REPEAT_SET_CARRIED].to_vec();
        let mut remaining: Vec<u8> = self
            .ranked
            .iter()
            .take(REPEAT_SET_POOL)
            .map(|(c, _)| *c)
            .filter(|c| !numbers.contains(c))
            .collect();
        remaining.shuffle(rng);
        numbers.extend(remaining.into_iter().take(PICK_COUNT - REPEAT_SET_CARRIED));
        CandidateSubset::new(&numbers).ok()
    }

    fn sampled_set(
        &self,
        rng: &mut StdRng,
        used: &BTreeSet<CandidateSubset>,
    ) -> Option<CandidateSubset> {
        let pool: Vec<(u8, f64)> =
            self.ranked.iter().take(self.candidate_pool).copied().collect();
        let mut candidate = None;
        for attempt in 0..SAMPLE_ATTEMPTS {
            let sampled = pool.choose_multiple_weighted(rng, PICK_COUNT, |(_, w)| w.max(0.0));
            let picks: Vec<u8> = match sampled {
                Ok(chosen) => chosen.map(|(c, _)| *c).collect(),
                Err(e) => {
                    log::debug!("Weighted sampling unavailable: {}", e);
                    pool.iter().take(PICK_COUNT).map(|(c, _)| *c).collect()
                }
            };
            let Ok(subset) = CandidateSubset::new(&picks) else {
                continue;
            };
            candidate = Some(subset);
            let acceptable = self.is_valid(&subset) || attempt > ACCEPT_INVALID_AFTER;
            if !used.contains(&subset) && acceptable {
                break;
            }
        }
        candidate
    }

    /// Carry-over statistics and how the ensemble rates repeating the last draw.
    pub fn repeat_analysis(&self) -> Option<RepeatSummary> {
        let last = self.history.last()?;
        let mut carried_histogram = vec![0usize; PICK_COUNT + 1];
        for pair in self.history.draws().windows(2) {
            carried_histogram[pair[0].numbers.hits(&pair[1].numbers)] += 1;
        }
        let pairs: usize = carried_histogram.iter().sum();
        let mean_carried = if pairs == 0 {
            0.0
        } else {
            carried_histogram
                .iter()
                .enumerate()
                .map(|(shared, count)| (shared * count) as f64)
                .sum::<f64>()
                / pairs as f64
        };

        let mut ranked_repeats: Vec<(u8, f64)> = last
            .numbers
            .numbers()
            .iter()
            .map(|c| (*c, self.ensemble_scores.get(*c)))
            .collect();
        ranked_repeats.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        Some(RepeatSummary {
            last_draw: last.numbers.as_slice().to_vec(),
            mean_carried,
            carried_histogram,
            ranked_repeats,
        })
    }

    /// Full summary for display or export.
    pub fn report(&self, sets: usize) -> Result<EnsembleReport> {
        let predictions = self.predict_sets(sets)?;
        let top_validation = predictions.first().and_then(|p| {
            self.optimizer
                .validator()
                .map(|v| v.validate(p.numbers.as_slice()))
        });

        Ok(EnsembleReport {
            draws_analysed: self.history.len(),
            last_round: self.history.last().map(|d| d.round),
            engine_predictions: self.engine_predictions.clone(),
            failed_engines: self.failed_engines.clone(),
            weights: self.weights.clone(),
            boosts: self.boosts.clone(),
            ensemble_scores: self.ensemble_scores.clone(),
            predictions,
            sum_range: self.sum_range(),
            top_validation,
            hot_cold: FrequencyEngine::hot_cold(&self.history, HOT_COLD_WINDOW, HOT_COLD_TOP),
            repeat_analysis: self.repeat_analysis(),
        })
    }
}

/// Record an engine failure for the report. The ensemble carries on without
/// that engine's output for the failed stage.
fn isolate(
    failed: &mut BTreeMap<EngineId, String>,
    engine: &str,
    stage: &str,
    reason: impl Display,
) {
    let failure = EnsembleError::EngineFailure {
        engine: engine.to_string(),
        reason: format!("{} ({})", reason, stage),
    };
    log::warn!("{}", failure);
    failed.insert(engine.to_string(), failure.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::scoring::heuristics::fixtures::random_history;

    fn quiet_config() -> EnsembleConfig {
        EnsembleConfig {
            use_dynamic_boost: false,
            ..EnsembleConfig::default()
        }
    }

    #[test]
    fn test_no_engines_falls_back_to_uniform() {
        let history = random_history(10, 2);
        let predictor = EnsemblePredictor::new(
            &EngineRegistry::new(),
            &history,
            &quiet_config(),
            &SelectionConfig::default(),
        )
        .unwrap();

        assert!(predictor.ensemble_scores().values().iter().all(|s| *s == 1.0));
        let single = predictor.predict_single().unwrap();
        assert!(single.numbers.as_slice().iter().all(|c| *c <= 20));
        assert!(single.confidence <= 60.0);
    }

    #[test]
    fn test_sets_are_reproducible() {
        let history = random_history(80, 9);
        let build = || {
            EnsemblePredictor::new(
                &EngineRegistry::builtin(),
                &history,
                &quiet_config(),
                &SelectionConfig::default(),
            )
            .unwrap()
        };

        let first = build().predict_sets(4).unwrap();
        let second = build().predict_sets(4).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty() && first.len() <= 4);
        assert!(build().predict_sets(0).unwrap().is_empty());
    }

    #[test]
    fn test_repeat_analysis_counts_carry_over() {
        let history = DrawHistory::from_rows(vec![
            (1, [1, 2, 3, 4, 5, 6]),
            (2, [1, 2, 3, 10, 11, 12]),
            (3, [1, 10, 20, 30, 40, 45]),
        ])
        .unwrap();
        let predictor = EnsemblePredictor::new(
            &EngineRegistry::builtin(),
            &history,
            &quiet_config(),
            &SelectionConfig::default(),
        )
        .unwrap();

        let summary = predictor.repeat_analysis().unwrap();
        assert_eq!(summary.last_draw, vec![1, 10, 20, 30, 40, 45]);
        assert_eq!(summary.carried_histogram, vec![0, 0, 1, 1, 0, 0, 0]);
        assert!((summary.mean_carried - 2.5).abs() < 1e-12);
        assert_eq!(summary.ranked_repeats.len(), 6);
        for pair in summary.ranked_repeats.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        for (candidate, score) in &summary.ranked_repeats {
            assert_eq!(*score, predictor.ensemble_scores().get(*candidate));
        }
        let report = predictor.report(1).unwrap();
        assert_eq!(report.repeat_analysis, Some(summary));
    }

    #[test]
    fn test_repeat_set_carries_last_draw() {
        let history = random_history(40, 4);
        let predictor = EnsemblePredictor::new(
            &EngineRegistry::builtin(),
            &history,
            &quiet_config(),
            &SelectionConfig::default(),
        )
        .unwrap();

        let last = history.last().unwrap().numbers;
        let set = predictor
            .repeat_set(&mut StdRng::seed_from_u64(49))
            .unwrap();
        assert!(set.contains(last.as_slice()[0]));
        assert!(set.contains(last.as_slice()[1]));
    }
}
