use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnvironmentError>;

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("Environment file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Environment {environment} references unknown application {application}")]
    UnknownApplication {
        environment: String,
        application: String,
    },

    #[error("Cannot sample {requested} items from a population of {available}")]
    SampleTooLarge { requested: usize, available: usize },

    #[error("Malformed bulk file at line {line}: {reason}")]
    MalformedBulk { line: usize, reason: String },

    #[error("Catalog error: {0}")]
    CatalogError(#[from] envrec_catalog::CatalogError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
