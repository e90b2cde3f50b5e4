pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod types;

pub use error::{EnsembleError, Result};
pub use types::{
    CandidateSubset, EngineId, HistoricalDraw, HitHistogram, ScoreVector, WeightVector,
    CANDIDATE_COUNT, PICK_COUNT,
};
