//! # Envrec Vectorizer
//!
//! Fixed-dimension one-hot vectors for sets of format tags. The vocabulary fitted when the
//! vector index is built is persisted and reused to encode every query, so index-time and
//! query-time vectors always share dimension and feature order.

mod error;
mod vectorizer;

pub use error::{Result, VectorizerError};
pub use vectorizer::{FormatVectorizer, VOCABULARY_SCHEMA_VERSION};
