pub mod traits;
pub mod registry;
pub mod heuristics;

pub use traits::ScoringEngine;
pub use registry::{EngineConstructor, EngineRegistry};
