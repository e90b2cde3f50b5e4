use drawensemble::config::{EnsembleConfig, SelectionConfig};
use drawensemble::data::DrawHistory;
use drawensemble::engines::ensemble::EnsemblePredictor;
use drawensemble::engines::scoring::{EngineRegistry, ScoringEngine};
use drawensemble::{ScoreVector, WeightVector};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use std::collections::BTreeSet;

struct Band {
    id: &'static str,
    low: u8,
}

impl ScoringEngine for Band {
    fn id(&self) -> &str {
        self.id
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Ok(ScoreVector::from_fn(|c| {
            if (self.low..self.low + 6).contains(&c) {
                1.0
            } else {
                0.0
            }
        }))
    }
}

/// Builds fine but cannot produce scores.
struct Flaky;

impl ScoringEngine for Flaky {
    fn id(&self) -> &str {
        "flaky"
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Err(anyhow::anyhow!("window too short"))
    }
}

/// Scores normally but names numbers outside the candidate range.
struct OffRange;

impl ScoringEngine for OffRange {
    fn id(&self) -> &str {
        "offrange"
    }

    fn scores(&self) -> anyhow::Result<ScoreVector> {
        Ok(ScoreVector::from_fn(|c| if c == 45 { 1.0 } else { 0.0 }))
    }

    fn predict(&self, _k: usize) -> anyhow::Result<Vec<u8>> {
        Ok(vec![0, 2, 3, 4, 5, 46])
    }
}

fn two_draws() -> DrawHistory {
    DrawHistory::from_rows(vec![
        (1, [7, 13, 21, 27, 34, 41]),
        (2, [10, 17, 22, 28, 33, 39]),
    ])
    .unwrap()
}

fn synthetic_history(rounds: usize, seed: u64) -> DrawHistory {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = (0..rounds).map(|i| {
        let mut numbers = [0u8; 6];
        for (slot, idx) in numbers.iter_mut().zip(sample(&mut rng, 45, 6).iter()) {
            *slot = idx as u8 + 1;
        }
        (i as u32 + 1, numbers)
    });
    DrawHistory::from_rows(rows).unwrap()
}

fn two_engines_and_a_broken_one() -> EngineRegistry {
    let mut registry = EngineRegistry::new();
    registry.register("alpha", |_| {
        Ok(Box::new(Band { id: "alpha", low: 1 }) as Box<dyn ScoringEngine>)
    });
    registry.register("beta", |_| {
        Ok(Box::new(Band { id: "beta", low: 40 }) as Box<dyn ScoringEngine>)
    });
    registry.register("broken", |_| Err(anyhow::anyhow!("model file missing")));
    registry
}

#[test]
fn test_failed_engine_is_isolated() {
    let history = DrawHistory::from_rows(vec![
        (1, [7, 13, 21, 27, 34, 41]),
        (2, [10, 17, 22, 28, 33, 39]),
    ])
    .unwrap();
    let config = EnsembleConfig {
        default_weights: WeightVector::from_pairs([("alpha", 0.6), ("beta", 0.2), ("broken", 0.2)]),
        use_dynamic_boost: false,
        ..EnsembleConfig::default()
    };

    let predictor = EnsemblePredictor::new(
        &two_engines_and_a_broken_one(),
        &history,
        &config,
        &SelectionConfig::default(),
    )
    .unwrap();

    assert_eq!(predictor.engine_ids(), vec!["alpha", "beta"]);
    assert!(predictor.failed_engines().contains_key("broken"));
    let weights = predictor.weights();
    assert!((weights.get("alpha").unwrap() - 0.75).abs() < 1e-9);
    assert!((weights.get("beta").unwrap() - 0.25).abs() < 1e-9);
    assert!(weights.get("broken").is_none());

    // alpha: 0.55 * 0.75 + 0.30 vote; beta: 0.55 * 0.25 + 0.30 vote
    let scores = predictor.ensemble_scores();
    assert!((scores.get(1) - 1.0).abs() < 1e-9);
    assert!((scores.get(40) - 0.4375 / 0.7125).abs() < 1e-9);
    assert!((scores.get(22) - 0.15 / 0.7125).abs() < 1e-9);
    assert_eq!(scores.top(6), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_engine_failing_to_score_is_isolated() {
    let mut registry = two_engines_and_a_broken_one();
    registry.register("flaky", |_| Ok(Box::new(Flaky) as Box<dyn ScoringEngine>));
    let config = EnsembleConfig {
        default_weights: WeightVector::from_pairs([("alpha", 0.6), ("beta", 0.2), ("flaky", 0.2)]),
        enabled_engines: Some(vec!["alpha".into(), "beta".into(), "flaky".into()]),
        use_dynamic_boost: false,
        ..EnsembleConfig::default()
    };

    let predictor =
        EnsemblePredictor::new(&registry, &two_draws(), &config, &SelectionConfig::default())
            .unwrap();

    assert_eq!(predictor.engine_ids(), vec!["alpha", "beta"]);
    assert_eq!(
        predictor.failed_engines()["flaky"],
        "Engine flaky failed: window too short (score)"
    );
    assert!(!predictor.engine_scores().contains_key("flaky"));
    let weights = predictor.weights();
    assert!((weights.get("alpha").unwrap() - 0.75).abs() < 1e-9);
    assert!((weights.get("beta").unwrap() - 0.25).abs() < 1e-9);
    assert!(weights.get("flaky").is_none());

    let scores = predictor.ensemble_scores();
    assert!((scores.get(1) - 1.0).abs() < 1e-9);
    assert!((scores.get(40) - 0.4375 / 0.7125).abs() < 1e-9);
    assert!((scores.get(22) - 0.15 / 0.7125).abs() < 1e-9);
}

#[test]
fn test_out_of_range_prediction_is_isolated() {
    let mut registry = EngineRegistry::new();
    registry.register("offrange", |_| Ok(Box::new(OffRange) as Box<dyn ScoringEngine>));
    let config = EnsembleConfig {
        default_weights: WeightVector::from_pairs([("offrange", 1.0)]),
        use_dynamic_boost: false,
        ..EnsembleConfig::default()
    };

    let predictor =
        EnsemblePredictor::new(&registry, &two_draws(), &config, &SelectionConfig::default())
            .unwrap();

    assert!(predictor.failed_engines().contains_key("offrange"));
    assert!(predictor.engine_predictions().is_empty());
    assert_eq!(predictor.engine_ids(), vec!["offrange"]);
    // Scores still count: 0.55 weighted at 45 against 0.15 for the last draw.
    let scores = predictor.ensemble_scores();
    assert!((scores.get(45) - 1.0).abs() < 1e-9);
    assert!((scores.get(22) - 0.15 / 0.55).abs() < 1e-9);
    assert_eq!(scores.get(2), 0.0);
}

#[test]
fn test_builtin_pipeline_produces_distinct_sets() {
    let history = synthetic_history(120, 21);
    let predictor = EnsemblePredictor::new(
        &EngineRegistry::builtin(),
        &history,
        &EnsembleConfig::default(),
        &SelectionConfig::default(),
    )
    .unwrap();

    assert_eq!(predictor.engine_ids().len(), 10);
    assert!((predictor.weights().total() - 1.0).abs() < 1e-9);
    for boost in predictor.boosts().values() {
        assert!((1.0..=1.3 + 1e-9).contains(boost));
    }

    let report = predictor.report(5).unwrap();
    assert!(!report.predictions.is_empty() && report.predictions.len() <= 5);
    let distinct: BTreeSet<_> = report.predictions.iter().map(|p| p.numbers).collect();
    assert_eq!(distinct.len(), report.predictions.len());
    for pair in report.predictions.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
    for prediction in &report.predictions {
        assert!((0.0..=100.0).contains(&prediction.confidence));
    }
    assert_eq!(report.last_round, Some(120));

    let repeats = report.repeat_analysis.as_ref().unwrap();
    assert_eq!(repeats.last_draw.len(), 6);
    assert_eq!(repeats.carried_histogram.iter().sum::<usize>(), 119);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"ensemble_scores\""));
    assert!(json.contains("\"repeat_analysis\""));
}

#[test]
fn test_empty_history_is_rejected() {
    let history = DrawHistory::new(Vec::new()).unwrap();
    let result = EnsemblePredictor::new(
        &EngineRegistry::builtin(),
        &history,
        &EnsembleConfig::default(),
        &SelectionConfig::default(),
    );
    assert!(result.is_err());
}
