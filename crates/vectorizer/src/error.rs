use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorizerError>;

#[derive(Error, Debug)]
pub enum VectorizerError {
    #[error("Vectorizer has not been fitted")]
    NotFitted,

    #[error("Vocabulary file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Unsupported vocabulary schema_version {actual} (expected {expected})")]
    UnsupportedSchema { expected: u32, actual: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
