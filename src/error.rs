use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnsembleError {
    #[error("Insufficient history: {required} rounds required, {available} available")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Invalid draw: {0}")]
    InvalidDraw(String),

    #[error("Invalid combination: {0}")]
    InvalidCombination(String),

    #[error("Engine {engine} failed: {reason}")]
    EngineFailure { engine: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("Optimization cancelled")]
    Cancelled,

    #[error("Worker failure: {0}")]
    WorkerFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EnsembleError>;
