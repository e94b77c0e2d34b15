use crate::backend::SearchBackend;
use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::types::{parse_hits, BulkOutcome, RawBulkResponse, SearchHit};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

const NDJSON: &str = "application/x-ndjson";

/// HTTP client for an OpenSearch-compatible service. Requests are issued one at a time by the
/// caller and are never retried.
pub struct OpenSearchClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl OpenSearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }

    /// Logs the status line; `None` for non-success statuses.
    async fn checked(
        &self,
        method: &str,
        url: &str,
        response: Response,
    ) -> Result<Option<Vec<u8>>> {
        let status = response.status();
        log::info!("response for {method} {url} : {}", status.as_u16());
        let body = response.bytes().await?;
        if status.is_success() {
            return Ok(Some(body.to_vec()));
        }
        log::error!(
            "{method} {url} failed with status {}: {}",
            status.as_u16(),
            String::from_utf8_lossy(&body)
        );
        Ok(None)
    }
}

#[async_trait]
impl SearchBackend for OpenSearchClient {
    async fn bulk_load(&self, ndjson: String) -> Result<BulkOutcome> {
        let url = self.url("_bulk");
        log::info!("request POST {url}");
        let response = self
            .authed(self.http.post(&url))
            .header(CONTENT_TYPE, NDJSON)
            .body(ndjson)
            .send()
            .await?;
        let Some(body) = self.checked("POST", &url, response).await? else {
            return Ok(BulkOutcome::default());
        };
        let parsed: RawBulkResponse =
            serde_json::from_slice(&body).map_err(|err| SearchError::MalformedResponse {
                endpoint: url.clone(),
                reason: err.to_string(),
            })?;
        if parsed.errors {
            log::warn!("bulk load reported item errors");
        } else {
            log::info!("environment data successfully loaded");
        }
        Ok(BulkOutcome {
            accepted: true,
            items: parsed.items.len(),
            errors: parsed.errors,
        })
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<bool> {
        let url = self.url(index);
        log::info!("request PUT {url}");
        let response = self.authed(self.http.put(&url)).json(body).send().await?;
        Ok(self.checked("PUT", &url, response).await?.is_some())
    }

    async fn delete_index(&self, index: &str) -> Result<bool> {
        let url = self.url(index);
        log::info!("Deleting index {index}");
        let response = self.authed(self.http.delete(&url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            log::warn!("Index {index} does not exist, nothing to delete");
            return Ok(false);
        }
        Ok(self.checked("DELETE", &url, response).await?.is_some())
    }

    async fn search(&self, index: &str, body: &Value) -> Result<Vec<SearchHit>> {
        let url = self.url(&format!("{index}/_search"));
        log::info!("request POST {url}");
        let response = self.authed(self.http.post(&url)).json(body).send().await?;
        match self.checked("POST", &url, response).await? {
            Some(bytes) => {
                let hits = parse_hits(&url, &bytes)?;
                log::debug!("response output {hits:?}");
                Ok(hits)
            }
            None => Ok(Vec::new()),
        }
    }
}
