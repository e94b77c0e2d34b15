//! # Envrec Search
//!
//! Adapter for the external document search service that stores environment documents.
//! Scoring (BM25, cosine similarity) happens entirely inside the service; this crate builds
//! requests, sends them one at a time and reads ranked hits back.

mod backend;
mod client;
mod config;
mod error;
pub mod query;
mod types;

pub use backend::{EnvironmentIndex, SearchBackend};
pub use client::OpenSearchClient;
pub use config::{
    SearchConfig, DEFAULT_SEARCH_URL, FORMAT_FIELD, KEYWORD_INDEX, VECTOR_FIELD, VECTOR_INDEX,
};
pub use error::{Result, SearchError};
pub use types::{parse_hits, BulkOutcome, SearchHit};
