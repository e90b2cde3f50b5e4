pub mod connectors;
pub mod history;
pub mod weights;

pub use connectors::{CsvConnector, DataValidator, DatasetMetadata};
pub use history::DrawHistory;
pub use weights::{JsonWeightStore, MemoryWeightStore, TunedWeights, WeightStore};
