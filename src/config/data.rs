use super::traits::ConfigSection;
use crate::error::EnsembleError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub history_path: PathBuf,
    /// Smallest history the predictor will work from.
    pub min_rounds: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from("data/draws.csv"),
            min_rounds: 100,
        }
    }
}

impl ConfigSection for DataConfig {
    fn section_name() -> &'static str {
        "data"
    }

    fn validate(&self) -> Result<(), EnsembleError> {
        if self.min_rounds == 0 {
            return Err(EnsembleError::Configuration(
                "data.min_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
