use crate::config::{EnsembleConfig, SelectionConfig};
use crate::data::DrawHistory;
use crate::engines::ensemble::EnsemblePredictor;
use crate::engines::scoring::EngineRegistry;
use crate::error::Result;
use crate::types::{CandidateSubset, HitHistogram};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Outcome of predicting one held-out round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub sets: Vec<CandidateSubset>,
    pub actual: CandidateSubset,
    /// Hits of the best set against the actual draw
    pub best_hits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub rounds: Vec<RoundOutcome>,
    pub histogram: HitHistogram,
    pub mean_hits: f64,
}

/// Walk-forward backtest of the full prediction pipeline.
///
/// Unlike the evaluation cache this rebuilds the predictor, boosts and
/// selection included, for every held-out round.
pub struct Backtester {
    registry: EngineRegistry,
    ensemble: EnsembleConfig,
    selection: SelectionConfig,
    min_rounds: usize,
}

impl Backtester {
    pub fn new(
        registry: EngineRegistry,
        ensemble: EnsembleConfig,
        selection: SelectionConfig,
        min_rounds: usize,
    ) -> Self {
        Self {
            registry,
            ensemble,
            selection,
            min_rounds,
        }
    }

    /// Predict each of the last `last_n` rounds from the draws before it.
    pub fn run(&self, history: &DrawHistory, last_n: usize, sets: usize) -> Result<BacktestReport> {
        history.require(last_n + self.min_rounds)?;
        let start = Instant::now();
        let first = history.len() - last_n;

        let rounds = (first..history.len())
            .into_par_iter()
            .map(|index| self.run_round(history, index, sets))
            .collect::<Result<Vec<_>>>()?;

        let mut histogram = HitHistogram::default();
        for outcome in &rounds {
            histogram.record(outcome.best_hits);
        }
        let mean_hits = histogram.mean();
        log::info!(
            "Backtested {} rounds in {:.2?}: mean best hits {:.3}",
            rounds.len(),
            start.elapsed(),
            mean_hits
        );

        Ok(BacktestReport {
            rounds,
            histogram,
            mean_hits,
        })
    }

    fn run_round(&self, history: &DrawHistory, index: usize, sets: usize) -> Result<RoundOutcome> {
        let target = &history.draws()[index];
        let predictor =
            EnsemblePredictor::new(
                &self.registry,
                &history.prefix(index),
                &self.ensemble,
                &self.selection,
            )?;
        let sets: Vec<CandidateSubset> = predictor
            .predict_sets(sets.max(1))?
            .into_iter()
            .map(|p| p.numbers)
            .collect();
        let best_hits = sets
            .iter()
            .map(|s| s.hits(&target.numbers))
            .max()
            .unwrap_or(0);
        log::debug!("Round {}: best set hit {}", target.round, best_hits);

        Ok(RoundOutcome {
            round: target.round,
            sets,
            actual: target.numbers,
            best_hits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::scoring::heuristics::fixtures::random_history;
    use crate::error::EnsembleError;

    fn backtester(min_rounds: usize) -> Backtester {
        let ensemble = EnsembleConfig {
            use_dynamic_boost: false,
            ..EnsembleConfig::default()
        };
        Backtester::new(
            EngineRegistry::builtin(),
            ensemble,
            SelectionConfig::default(),
            min_rounds,
        )
    }

    #[test]
    fn test_rounds_in_chronological_order() {
        let history = random_history(60, 5);
        let report = backtester(40).run(&history, 3, 2).unwrap();

        let rounds: Vec<u32> = report.rounds.iter().map(|r| r.round).collect();
        let expected: Vec<u32> = history.tail(3).iter().map(|d| d.round).collect();
        assert_eq!(rounds, expected);
        assert_eq!(report.histogram.total(), 3);
        for outcome in &report.rounds {
            assert!(!outcome.sets.is_empty() && outcome.sets.len() <= 2);
            assert!(outcome.best_hits <= 6);
        }
    }

    #[test]
    fn test_requires_training_rounds() {
        let history = random_history(20, 1);
        match backtester(40).run(&history, 5, 1) {
            Err(EnsembleError::InsufficientHistory { required, available }) => {
                assert_eq!(required, 45);
                assert_eq!(available, 20);
            }
            other => panic!("unexpected: {:?}", other.map(|r| r.mean_hits)),
        }
    }
}
