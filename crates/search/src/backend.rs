use crate::config::{SearchConfig, FORMAT_FIELD, VECTOR_FIELD};
use crate::error::{Result, SearchError};
use crate::query;
use crate::types::{BulkOutcome, SearchHit};
use async_trait::async_trait;
use serde_json::Value;

/// Store + query operations of the document search service.
///
/// Implementations report non-success statuses as empty/negative results and reserve `Err`
/// for transport failures and bodies that cannot be understood.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn bulk_load(&self, ndjson: String) -> Result<BulkOutcome>;

    async fn create_index(&self, index: &str, body: &Value) -> Result<bool>;

    async fn delete_index(&self, index: &str) -> Result<bool>;

    async fn search(&self, index: &str, body: &Value) -> Result<Vec<SearchHit>>;
}

/// The keyword and vector collections of environment documents.
pub struct EnvironmentIndex<'a, B: SearchBackend + ?Sized> {
    backend: &'a B,
    config: &'a SearchConfig,
}

impl<'a, B: SearchBackend + ?Sized> EnvironmentIndex<'a, B> {
    pub fn new(backend: &'a B, config: &'a SearchConfig) -> Self {
        Self { backend, config }
    }

    /// Environments whose format list contains `format`.
    pub async fn match_format(&self, format: &str) -> Result<Vec<SearchHit>> {
        if format.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        log::info!("environment querying for term {format} in field {FORMAT_FIELD}");
        let body = query::match_query(FORMAT_FIELD, format);
        self.backend.search(&self.config.keyword_index, &body).await
    }

    /// One combined query for several formats.
    pub async fn match_formats<S: AsRef<str> + Sync>(
        &self,
        formats: &[S],
    ) -> Result<Vec<SearchHit>> {
        if formats.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        log::info!(
            "environment querying for {} terms in field {FORMAT_FIELD}",
            formats.len()
        );
        let body = query::multi_match_query(&[FORMAT_FIELD], formats);
        self.backend.search(&self.config.keyword_index, &body).await
    }

    /// Nearest environments to a format vector.
    pub async fn nearest(&self, vector: &[f32]) -> Result<Vec<SearchHit>> {
        log::info!("knn querying with {}-dimensional vector", vector.len());
        let body = query::knn_query(VECTOR_FIELD, vector, self.config.knn_size);
        self.backend.search(&self.config.vector_index, &body).await
    }

    /// Creates the vector collection from a settings body such as
    /// [`query::knn_index_settings`].
    pub async fn create_vector_index(&self, settings: &Value) -> Result<bool> {
        log::info!("Creating index {}", self.config.vector_index);
        self.backend
            .create_index(&self.config.vector_index, settings)
            .await
    }

    /// Deletes both collections so a reload does not leave stale documents behind.
    pub async fn reset(&self) -> Result<()> {
        for index in [&self.config.keyword_index, &self.config.vector_index] {
            self.backend.delete_index(index).await?;
        }
        Ok(())
    }

    pub async fn bulk_load(&self, ndjson: String) -> Result<BulkOutcome> {
        self.backend.bulk_load(ndjson).await
    }
}
