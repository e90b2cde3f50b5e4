use drawensemble::config::ConfigManager;
use drawensemble::data::{CsvConnector, JsonWeightStore, TunedWeights, WeightStore};
use drawensemble::{EnsembleError, WeightVector};
use std::path::PathBuf;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/draws_sample.csv")
}

#[test]
fn test_load_sample_history() {
    let history = CsvConnector::load_history(fixture(), 100).unwrap();
    assert_eq!(history.len(), 120);
    assert_eq!(history.get(0).unwrap().numbers.numbers(), &[8, 17, 27, 30, 31, 38]);
    assert_eq!(history.last().unwrap().round, 120);

    let metadata = CsvConnector::create_metadata(fixture(), &history);
    assert_eq!(metadata.first_round, Some(1));
    assert_eq!(metadata.num_rows, 120);
}

#[test]
fn test_newest_first_file_loads_in_round_order() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/draws_descending.csv");
    let history = CsvConnector::load_history(path, 3).unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.get(0).unwrap().round, 1);
    assert_eq!(history.get(0).unwrap().numbers.numbers(), &[1, 12, 20, 28, 37, 45]);
    assert_eq!(history.last().unwrap().round, 3);
    assert_eq!(history.last().unwrap().numbers.numbers(), &[5, 14, 23, 29, 36, 44]);
}

#[test]
fn test_minimum_rows_enforced() {
    let result = CsvConnector::load_history(fixture(), 500);
    assert!(matches!(result, Err(EnsembleError::DataLoading(_))));
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(CsvConnector::load_history("tests/data/absent.csv", 1).is_err());
}

#[test]
fn test_tuned_weights_feed_back_into_config() {
    let path = std::env::temp_dir()
        .join(format!("drawensemble-feedback-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let mut store = JsonWeightStore::new(&path);

    let weights = WeightVector::from_pairs([("frequency", 3.0), ("gap", 1.0)]);
    let tuned = TunedWeights::new(weights, 0.91);
    store.store(&tuned).unwrap();
    let loaded = store.load().unwrap().unwrap();

    let manager = ConfigManager::new();
    manager.apply_tuned_weights(&loaded).unwrap();
    let weights = manager.get().ensemble.default_weights;
    assert_eq!(weights.get("frequency"), Some(0.75));
    assert_eq!(weights.get("gap"), Some(0.25));
    assert!(weights.get("poisson").is_none());

    let _ = std::fs::remove_file(&path);
}
