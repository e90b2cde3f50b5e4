pub mod cache;
pub mod cancel;
pub mod genetic;
pub mod operators;
pub mod parallel;
pub mod progress;

pub use cache::{CachedEvaluation, Evaluation};
pub use cancel::CancellationToken;
pub use genetic::{OptimizationOutcome, OptimizerState, WeightOptimizer};
pub use parallel::{FitnessPool, ScoredMember};
pub use progress::{
    ChannelProgressCallback, ConsoleProgressCallback, NoopProgress, ProgressCallback,
    ProgressMessage, ProgressTick,
};
