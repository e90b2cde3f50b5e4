pub mod combiner;
pub mod boost;
pub mod predictor;

pub use combiner::combine;
pub use boost::compute_boost;
pub use predictor::{EnsemblePredictor, EnsembleReport, Prediction, RepeatSummary};
