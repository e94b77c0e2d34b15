use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Data directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Identification report {} could not be read: {reason}", .path.display())]
    InvalidReport { path: PathBuf, reason: String },

    #[error("Search result names unknown environment {0}")]
    UnknownEnvironment(String),

    #[error("Vector strategy requires a fitted vectorizer")]
    MissingVectorizer,

    #[error("Search error: {0}")]
    SearchError(#[from] envrec_search::SearchError),

    #[error("Vectorizer error: {0}")]
    VectorizerError(#[from] envrec_vectorizer::VectorizerError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
