use crate::error::{EvalError, Result};
use crate::identification::IdentificationReport;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Identified test images found under a data directory.
#[derive(Debug, Clone, Default)]
pub struct ImageCorpus {
    images: Vec<(PathBuf, IdentificationReport)>,
}

impl ImageCorpus {
    /// Reads every `*.json` report below `dir`, in path order. Reports that cannot be read are
    /// logged and skipped.
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            log::error!("{} does not exist", dir.display());
            return Err(EvalError::MissingDirectory(dir.to_path_buf()));
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    log::warn!("skipping unreadable entry: {err}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            match IdentificationReport::load(&path) {
                Ok(report) => images.push((path, report)),
                Err(err) => log::error!("{err}"),
            }
        }
        log::info!("Found {} identified images in {}", images.len(), dir.display());
        Ok(Self { images })
    }

    pub fn from_reports(images: Vec<(PathBuf, IdentificationReport)>) -> Self {
        Self { images }
    }

    pub fn images(&self) -> &[(PathBuf, IdentificationReport)] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Number of images each best-match format occurs in, most frequent first
    /// (ties in tag order).
    pub fn format_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for (_, report) in &self.images {
            for tag in report.unique_best_matches() {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Distinct best-match formats across the corpus, sorted.
    pub fn unique_formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self
            .format_counts()
            .into_iter()
            .map(|(tag, _)| tag)
            .collect();
        formats.sort();
        formats
    }

    /// Writes `{tag: occurrences}` ordered by occurrences.
    pub fn write_format_counts(&self, path: impl AsRef<Path>) -> Result<()> {
        let map: serde_json::Map<String, serde_json::Value> = self
            .format_counts()
            .into_iter()
            .map(|(tag, count)| (tag, serde_json::Value::from(count)))
            .collect();
        std::fs::write(path.as_ref(), serde_json::to_string(&map)?)?;
        log::info!("Format occurrences written to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_report(dir: &Path, name: &str, best: &[&str]) {
        let files: Vec<_> = best
            .iter()
            .map(|id| serde_json::json!({"filename": "f", "matches": [{"id": id}]}))
            .collect();
        std::fs::write(dir.join(name), serde_json::json!({"files": files}).to_string()).unwrap();
    }

    #[test]
    fn scan_reads_reports_and_skips_broken_ones() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("nested")).unwrap();
        write_report(tmp.path(), "b.json", &["Q2", "Q1"]);
        write_report(&tmp.path().join("nested"), "a.json", &["Q1", "UNKNOWN"]);
        std::fs::write(tmp.path().join("broken.json"), "[").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let corpus = ImageCorpus::scan(tmp.path()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(
            corpus.format_counts(),
            vec![("Q1".to_string(), 2), ("Q2".to_string(), 1)]
        );
        assert_eq!(corpus.unique_formats(), vec!["Q1", "Q2"]);
    }

    #[test]
    fn counts_file_is_ordered_by_occurrence() {
        let tmp = TempDir::new().unwrap();
        write_report(tmp.path(), "1.json", &["Q9"]);
        write_report(tmp.path(), "2.json", &["Q5", "Q9"]);
        let corpus = ImageCorpus::scan(tmp.path()).unwrap();
        let out = tmp.path().join("counts.out");
        corpus.write_format_counts(&out).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            r#"{"Q9":2,"Q5":1}"#
        );
    }

    #[test]
    fn missing_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            ImageCorpus::scan(tmp.path().join("sfdata2")),
            Err(EvalError::MissingDirectory(_))
        ));
    }
}
