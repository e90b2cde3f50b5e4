use super::traits::ConfigSection;
use crate::error::EnsembleError;
use crate::types::WeightVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Base weight per engine. Replaced by `ConfigManager::apply_tuned_weights`.
    pub default_weights: WeightVector,
    pub use_dynamic_boost: bool,
    pub boost_lookback: usize,
    /// Engines skipped by the boost backtest; they keep a boost of 1.0.
    pub boost_excluded_engines: Vec<String>,
    pub use_validator: bool,
    /// Restrict the registry to these engine ids when set.
    pub enabled_engines: Option<Vec<String>>,
}

impl EnsembleConfig {
    pub fn default_weight_table() -> WeightVector {
        WeightVector::from_pairs([
            ("poisson", 0.2396),
            ("transition", 0.2172),
            ("frequency", 0.2000),
            ("gap", 0.0800),
            ("graph", 0.0745),
            ("timeseries", 0.0599),
            ("spectral", 0.0555),
            ("pattern", 0.0501),
            ("sequence", 0.0063),
            ("numerology", 0.0001),
        ])
    }
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            default_weights: Self::default_weight_table(),
            use_dynamic_boost: true,
            boost_lookback: 10,
            boost_excluded_engines: Vec::new(),
            use_validator: true,
            enabled_engines: None,
        }
    }
}

impl ConfigSection for EnsembleConfig {
    fn section_name() -> &'static str {
        "ensemble"
    }

    fn validate(&self) -> Result<(), EnsembleError> {
        if self.boost_lookback == 0 {
            return Err(EnsembleError::Configuration(
                "ensemble.boost_lookback must be at least 1".to_string(),
            ));
        }
        if let Some((id, _)) = self
            .default_weights
            .iter()
            .find(|(_, w)| !w.is_finite() || *w < 0.0)
        {
            return Err(EnsembleError::Configuration(format!(
                "ensemble.default_weights.{} must be a non-negative number",
                id
            )));
        }
        if matches!(&self.enabled_engines, Some(ids) if ids.is_empty()) {
            return Err(EnsembleError::Configuration(
                "ensemble.enabled_engines must name at least one engine".to_string(),
            ));
        }
        Ok(())
    }
}
