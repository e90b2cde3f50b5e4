use super::traits::ConfigSection;
use crate::error::EnsembleError;
use crate::types::{CANDIDATE_COUNT, PICK_COUNT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Top-ranked candidates enumerated by the combination optimizer.
    pub candidate_pool: usize,
    /// Prediction sets produced per request.
    pub sets: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            candidate_pool: 20,
            sets: 5,
        }
    }
}

impl ConfigSection for SelectionConfig {
    fn section_name() -> &'static str {
        "selection"
    }

    fn validate(&self) -> Result<(), EnsembleError> {
        if self.candidate_pool < PICK_COUNT || self.candidate_pool > CANDIDATE_COUNT {
            return Err(EnsembleError::Configuration(format!(
                "selection.candidate_pool must be between {} and {}",
                PICK_COUNT, CANDIDATE_COUNT
            )));
        }
        if self.sets == 0 {
            return Err(EnsembleError::Configuration(
                "selection.sets must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
