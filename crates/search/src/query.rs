//! Request bodies understood by the search service.

use serde_json::{json, Value};

/// Joins format tags into one multi-term query string.
pub const TERM_SEPARATOR: &str = "+";

pub fn match_query(field: &str, term: &str) -> Value {
    json!({
        "query": {
            "match": {
                field: term
            }
        }
    })
}

pub fn multi_match_query<S: AsRef<str>>(fields: &[&str], terms: &[S]) -> Value {
    let query = terms
        .iter()
        .map(|term| term.as_ref())
        .collect::<Vec<&str>>()
        .join(TERM_SEPARATOR);
    json!({
        "query": {
            "multi_match": {
                "query": query,
                "fields": fields
            }
        }
    })
}

/// Exact cosine nearest-neighbour scoring over every document.
pub fn knn_query(field: &str, vector: &[f32], size: usize) -> Value {
    json!({
        "size": size,
        "query": {
            "script_score": {
                "query": {
                    "match_all": {}
                },
                "script": {
                    "source": "knn_score",
                    "lang": "knn",
                    "params": {
                        "field": field,
                        "query_value": vector,
                        "space_type": "cosinesimil"
                    }
                }
            }
        }
    })
}

/// Index body declaring the vector field and its dimension.
pub fn knn_index_settings(field: &str, dimension: usize) -> Value {
    json!({
        "settings": {
            "index.knn": false
        },
        "mappings": {
            "properties": {
                field: {
                    "type": "knn_vector",
                    "dimension": dimension
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn multi_match_joins_terms() {
        let body = multi_match_query(&["fformats"], &["Q1", "Q2"]);
        assert_eq!(body["query"]["multi_match"]["query"], "Q1+Q2");
        assert_eq!(body["query"]["multi_match"]["fields"][0], "fformats");
    }

    #[test]
    fn match_uses_field_as_key() {
        let body = match_query("fformats", "Q9");
        assert_eq!(body, json!({"query": {"match": {"fformats": "Q9"}}}));
    }

    #[test]
    fn knn_query_carries_vector_and_size() {
        let body = knn_query("fformats_vector", &[1.0, 0.0], 4);
        assert_eq!(body["size"], 4);
        let params = &body["query"]["script_score"]["script"]["params"];
        assert_eq!(params["query_value"], json!([1.0, 0.0]));
        assert_eq!(params["space_type"], "cosinesimil");
    }

    #[test]
    fn settings_declare_dimension() {
        let body = knn_index_settings("fformats_vector", 12);
        assert_eq!(
            body["mappings"]["properties"]["fformats_vector"]["dimension"],
            12
        );
    }
}
