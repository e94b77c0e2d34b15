use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A ranked environment document returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub machine: String,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    hits: RawHits,
}

#[derive(Debug, Deserialize)]
struct RawHits {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: Value,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: RawSource,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    machine: String,
}

/// Extracts `hits.hits[]` from a search response body.
pub fn parse_hits(endpoint: &str, body: &[u8]) -> Result<Vec<SearchHit>> {
    let raw: RawResponse =
        serde_json::from_slice(body).map_err(|err| SearchError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })?;
    Ok(raw
        .hits
        .hits
        .into_iter()
        .map(|hit| SearchHit {
            id: match hit.id {
                Value::String(id) => id,
                other => other.to_string(),
            },
            score: hit.score.unwrap_or(0.0),
            machine: hit.source.machine,
        })
        .collect())
}

/// Summary of a bulk request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    /// The service answered with a success status.
    pub accepted: bool,
    pub items: usize,
    /// The service reported per-item failures.
    pub errors: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<Value>,
}
