pub mod traits;
pub mod data;
pub mod ensemble;
pub mod selection;
pub mod optimizer;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use data::DataConfig;
pub use ensemble::EnsembleConfig;
pub use selection::SelectionConfig;
pub use optimizer::OptimizerConfig;
pub use traits::ConfigSection;
