//! Newline-delimited bulk-load files: an action line followed by a document line, per document.
//!
//! ```text
//! {"index":{"_index":"environments","_id":1}}
//! {"machine":"ref_env_1","fformats":["Q1","Q2"]}
//! ```
//!
//! The search service requires the trailing newline.

use crate::definition::Environment;
use crate::error::{EnvironmentError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTarget {
    #[serde(rename = "_index")]
    pub collection: String,
    #[serde(rename = "_id")]
    pub id: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAction {
    pub index: IndexTarget,
}

/// Keyword-searchable environment document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDocument {
    pub machine: String,
    pub fformats: Vec<String>,
}

/// Vector-searchable environment document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    pub machine: String,
    pub fformats_vector: Vec<f32>,
}

impl From<&Environment> for FormatDocument {
    fn from(env: &Environment) -> Self {
        Self {
            machine: env.name.clone(),
            fformats: env.formats.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkEntry<D> {
    pub id: usize,
    pub document: D,
}

pub fn format_entries(environments: &[Environment]) -> Vec<BulkEntry<FormatDocument>> {
    environments
        .iter()
        .map(|env| BulkEntry {
            id: env.id,
            document: FormatDocument::from(env),
        })
        .collect()
}

pub fn encode<D: Serialize>(collection: &str, entries: &[BulkEntry<D>]) -> Result<String> {
    let mut out = String::new();
    for entry in entries {
        let action = BulkAction {
            index: IndexTarget {
                collection: collection.to_string(),
                id: entry.id,
            },
        };
        out.push_str(&serde_json::to_string(&action)?);
        out.push('\n');
        out.push_str(&serde_json::to_string(&entry.document)?);
        out.push('\n');
    }
    Ok(out)
}

pub fn decode<D: DeserializeOwned>(text: &str) -> Result<Vec<(IndexTarget, D)>> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line))
        .collect();
    if lines.len() % 2 != 0 {
        let (line, _) = lines[lines.len() - 1];
        return Err(EnvironmentError::MalformedBulk {
            line,
            reason: "action line without a document".to_string(),
        });
    }

    lines
        .chunks(2)
        .map(|pair| {
            let (action_line, action) = pair[0];
            let (document_line, document) = pair[1];
            let action: BulkAction =
                serde_json::from_str(action).map_err(|err| EnvironmentError::MalformedBulk {
                    line: action_line,
                    reason: err.to_string(),
                })?;
            let document: D =
                serde_json::from_str(document).map_err(|err| EnvironmentError::MalformedBulk {
                    line: document_line,
                    reason: err.to_string(),
                })?;
            Ok((action.index, document))
        })
        .collect()
}

/// Writes a bulk file, replacing any previous one.
pub fn write_bulk_file<D: Serialize>(
    path: impl AsRef<Path>,
    collection: &str,
    entries: &[BulkEntry<D>],
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, encode(collection, entries)?)?;
    log::info!(
        "Emulation environments mapping written to {} ({} documents)",
        path.display(),
        entries.len()
    );
    Ok(())
}

pub fn read_bulk_file<D: DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<Vec<(IndexTarget, D)>> {
    let path = path.as_ref();
    if !path.exists() {
        log::error!("{} does not exist", path.display());
        return Err(EnvironmentError::MissingFile(path.to_path_buf()));
    }
    decode(&std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn env(id: usize, name: &str, formats: &[&str]) -> Environment {
        Environment {
            id,
            name: name.to_string(),
            formats: formats.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn two_lines_per_document_with_trailing_newline() {
        let entries = format_entries(&[env(1, "ref_env_1", &["Q1", "Q2"])]);
        let text = encode("environments", &entries).unwrap();
        assert_eq!(
            text,
            "{\"index\":{\"_index\":\"environments\",\"_id\":1}}\n\
             {\"machine\":\"ref_env_1\",\"fformats\":[\"Q1\",\"Q2\"]}\n"
        );
    }

    #[test]
    fn written_documents_read_back_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reference_envs.json");
        let envs = vec![
            env(1, "ref_env_1", &["Q1", "Q2"]),
            env(2, "ref_env_2", &[]),
            env(5, "rand_env_5", &["Q9"]),
        ];
        write_bulk_file(&path, "environments", &format_entries(&envs)).unwrap();

        let back: Vec<(IndexTarget, FormatDocument)> = read_bulk_file(&path).unwrap();
        assert_eq!(back.len(), 3);
        for ((target, doc), env) in back.iter().zip(&envs) {
            assert_eq!(target.collection, "environments");
            assert_eq!(target.id, env.id);
            assert_eq!(doc.machine, env.name);
            assert_eq!(doc.fformats, env.formats);
        }
    }

    #[test]
    fn vector_documents_use_their_own_field() {
        let entries = vec![BulkEntry {
            id: 3,
            document: VectorDocument {
                machine: "ref_env_3".into(),
                fformats_vector: vec![1.0, 0.0],
            },
        }];
        let text = encode("knn-index", &entries).unwrap();
        let back: Vec<(IndexTarget, VectorDocument)> = decode(&text).unwrap();
        assert_eq!(back[0].0.collection, "knn-index");
        assert_eq!(back[0].1.fformats_vector, vec![1.0, 0.0]);
    }

    #[test]
    fn dangling_action_line_is_malformed() {
        let err =
            decode::<FormatDocument>("{\"index\":{\"_index\":\"e\",\"_id\":1}}\n").unwrap_err();
        assert!(matches!(err, EnvironmentError::MalformedBulk { line: 1, .. }));
    }
}
