use thiserror::Error;

#[derive(Error, Debug)]
pub enum CounterfactualError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Conformance error: {0}")]
    Conformance(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Schema mismatch: expected {expected} features, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, CounterfactualError>;
