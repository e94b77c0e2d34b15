use serde::{Deserialize, Serialize};

pub const DEFAULT_SEARCH_URL: &str = "https://localhost:9200";
pub const KEYWORD_INDEX: &str = "environments";
pub const VECTOR_INDEX: &str = "knn-index";
pub const FORMAT_FIELD: &str = "fformats";
pub const VECTOR_FIELD: &str = "fformats_vector";

/// Connection and collection settings for the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    /// The local service ships a self-signed certificate.
    pub accept_invalid_certs: bool,
    pub keyword_index: String,
    pub vector_index: String,
    /// Hits requested from a nearest-neighbour query.
    pub knn_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SEARCH_URL.to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
            accept_invalid_certs: true,
            keyword_index: KEYWORD_INDEX.to_string(),
            vector_index: VECTOR_INDEX.to_string(),
            knn_size: 4,
        }
    }
}
