use super::{
    data::DataConfig,
    ensemble::EnsembleConfig,
    optimizer::OptimizerConfig,
    selection::SelectionConfig,
    traits::ConfigSection,
};
use crate::data::TunedWeights;
use crate::error::EnsembleError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Environment variables override file values, e.g. `DRAWENSEMBLE__OPTIMIZER__GENERATIONS=20`.
pub const ENV_PREFIX: &str = "DRAWENSEMBLE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub ensemble: EnsembleConfig,
    pub selection: SelectionConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), EnsembleError> {
        self.data.validate()?;
        self.ensemble.validate()?;
        self.selection.validate()?;
        self.optimizer.validate()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EnsembleError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        log::info!("Loaded configuration from {}", path.as_ref().display());
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EnsembleError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| EnsembleError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| EnsembleError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` to a copy and keep it only if it still validates.
    pub fn update<F>(&self, f: F) -> Result<(), EnsembleError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }

    /// Make a tuned result the base weight table for subsequent predictions.
    pub fn apply_tuned_weights(&self, tuned: &TunedWeights) -> Result<(), EnsembleError> {
        let weights = tuned.weights.normalized();
        self.update(|config| config.ensemble.default_weights = weights)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WeightVector;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_update_rejects_invalid_values() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.optimizer.population_size = 1);
        assert!(result.is_err());
        assert_eq!(manager.get().optimizer.population_size, 10);
    }

    #[test]
    fn test_apply_tuned_weights() {
        let manager = ConfigManager::new();
        let weights = WeightVector::from_pairs([("frequency", 3.0), ("gap", 1.0)]);
        let tuned = TunedWeights::new(weights, 0.9);
        manager.apply_tuned_weights(&tuned).unwrap();

        let weights = manager.get().ensemble.default_weights;
        assert_eq!(weights.len(), 2);
        assert!((weights.get("frequency").unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("drawensemble-config-{}.toml", std::process::id()));
        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.optimizer.generations = 3;
                c.selection.sets = 2;
            })
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::new();
        reloaded.load_from_file(&path).unwrap();
        assert_eq!(reloaded.get().optimizer.generations, 3);
        assert_eq!(reloaded.get().selection.sets, 2);
        let _ = std::fs::remove_file(&path);
    }
}
