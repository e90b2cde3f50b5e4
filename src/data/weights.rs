use crate::error::Result;
use crate::types::{HitHistogram, WeightVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Result handed off by the weight optimizer: the tuned weights and the
/// fitness they reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunedWeights {
    pub weights: WeightVector,
    pub best_fitness: f64,
    pub hit_histogram: Option<HitHistogram>,
    pub generations: usize,
    pub trained_at: DateTime<Utc>,
}

impl TunedWeights {
    pub fn new(weights: WeightVector, best_fitness: f64) -> Self {
        Self {
            weights,
            best_fitness,
            hit_histogram: None,
            generations: 0,
            trained_at: Utc::now(),
        }
    }
}

/// Destination for new best-ever results.
pub trait WeightStore: Send {
    fn store(&mut self, tuned: &TunedWeights) -> Result<()>;
}

pub struct JsonWeightStore {
    path: PathBuf,
}

impl JsonWeightStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when nothing has been stored yet.
    pub fn load(&self) -> Result<Option<TunedWeights>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

impl WeightStore for JsonWeightStore {
    fn store(&mut self, tuned: &TunedWeights) -> Result<()> {
        let json = serde_json::to_string_pretty(tuned)?;
        std::fs::write(&self.path, json)?;
        log::info!(
            "Stored tuned weights (fitness {:.4}) to {}",
            tuned.best_fitness,
            self.path.display()
        );
        Ok(())
    }
}

/// Keeps every stored result in memory, newest last.
#[derive(Debug, Default)]
pub struct MemoryWeightStore {
    pub stored: Vec<TunedWeights>,
}

impl MemoryWeightStore {
    pub fn latest(&self) -> Option<&TunedWeights> {
        self.stored.last()
    }
}

impl WeightStore for MemoryWeightStore {
    fn store(&mut self, tuned: &TunedWeights) -> Result<()> {
        self.stored.push(tuned.clone());
        Ok(())
    }
}
