use super::traits::{check_range, ConfigSection};
use crate::error::EnsembleError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Upper bound of the weight moved when seeding the first population.
    pub seed_mutation_rate: f64,
    /// Upper bound of the weight moved when refilling from survivors.
    pub refill_mutation_rate: f64,
    /// Trailing rounds held out for fitness evaluation.
    pub test_window: usize,
    /// Rounds required before the first held-out round.
    pub min_training_rounds: usize,
    /// Fitness workers; defaults to available parallelism minus one.
    pub workers: Option<usize>,
    pub seed: Option<u64>,
    pub weights_path: PathBuf,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            generations: 10,
            seed_mutation_rate: 0.15,
            refill_mutation_rate: 0.08,
            test_window: 30,
            min_training_rounds: 100,
            workers: None,
            seed: None,
            weights_path: PathBuf::from("tuned_weights.json"),
        }
    }
}

impl ConfigSection for OptimizerConfig {
    fn section_name() -> &'static str {
        "optimizer"
    }

    fn validate(&self) -> Result<(), EnsembleError> {
        if self.population_size < 2 {
            return Err(EnsembleError::Configuration(
                "optimizer.population_size must be at least 2".to_string(),
            ));
        }
        if self.generations == 0 {
            return Err(EnsembleError::Configuration(
                "optimizer.generations must be at least 1".to_string(),
            ));
        }
        if self.test_window == 0 {
            return Err(EnsembleError::Configuration(
                "optimizer.test_window must be at least 1".to_string(),
            ));
        }
        check_range("optimizer", "seed_mutation_rate", self.seed_mutation_rate, 0.01, 1.0)?;
        check_range("optimizer", "refill_mutation_rate", self.refill_mutation_rate, 0.01, 1.0)?;
        if self.workers == Some(0) {
            return Err(EnsembleError::Configuration(
                "optimizer.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
