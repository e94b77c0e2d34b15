use crate::error::{EvalError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Sentinel id for files the identification tool could not match.
pub const UNKNOWN_FORMAT: &str = "UNKNOWN";

/// Format identification output for one disk image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentificationReport {
    #[serde(default)]
    pub files: Vec<IdentifiedFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentifiedFile {
    #[serde(default)]
    pub filename: Option<String>,
    /// Candidates, most confident first.
    #[serde(default)]
    pub matches: Vec<FormatMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormatMatch {
    pub id: String,
}

impl FormatMatch {
    pub fn is_known(&self) -> bool {
        self.id != UNKNOWN_FORMAT
    }
}

impl IdentifiedFile {
    /// Top-ranked candidate, unless it is the sentinel.
    pub fn best_match(&self) -> Option<&str> {
        self.matches
            .first()
            .filter(|m| m.is_known())
            .map(|m| m.id.as_str())
    }

    pub fn known_matches(&self) -> impl Iterator<Item = &str> {
        self.matches
            .iter()
            .filter(|m| m.is_known())
            .map(|m| m.id.as_str())
    }
}

fn dedup<'a>(tags: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.filter(|tag| seen.insert(*tag))
        .map(str::to_string)
        .collect()
}

impl IdentificationReport {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| EvalError::InvalidReport {
            path: path.to_path_buf(),
            reason,
        };
        let raw = std::fs::read(path).map_err(|err| invalid(err.to_string()))?;
        serde_json::from_slice(&raw).map_err(|err| invalid(err.to_string()))
    }

    /// Best match of every file, in file order; repeats are kept.
    pub fn best_matches(&self) -> Vec<String> {
        self.files
            .iter()
            .filter_map(IdentifiedFile::best_match)
            .map(str::to_string)
            .collect()
    }

    /// Distinct best matches across the image.
    pub fn unique_best_matches(&self) -> Vec<String> {
        dedup(self.files.iter().filter_map(IdentifiedFile::best_match))
    }

    /// Distinct candidates of every rank across the image.
    pub fn all_matches(&self) -> Vec<String> {
        dedup(self.files.iter().flat_map(IdentifiedFile::known_matches))
    }
}
