pub mod validator;
pub mod optimizer;

pub use validator::{CombinationMetrics, CombinationValidator, ValidationReport};
pub use optimizer::{CombinationOptimizer, Selection, SumRange};
