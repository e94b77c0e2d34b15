use crate::error::{Result, VectorizerError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

pub const VOCABULARY_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedVocabulary {
    schema_version: u32,
    features: Vec<String>,
}

/// One-hot encoder for sets of format tags.
///
/// `fit_transform` fixes the vocabulary (features sorted lexicographically); `transform` maps
/// onto it and silently drops tags that were not seen at fit time. The vector dimension never
/// changes between fits.
#[derive(Debug, Clone, Default)]
pub struct FormatVectorizer {
    features: Vec<String>,
    positions: HashMap<String, usize>,
    fitted: bool,
}

impl FormatVectorizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_features(features: Vec<String>) -> Self {
        let positions = features
            .iter()
            .enumerate()
            .map(|(idx, feature)| (feature.clone(), idx))
            .collect();
        Self {
            features,
            positions,
            fitted: true,
        }
    }

    /// Replaces the vocabulary with the tags of `rows` and encodes them.
    pub fn fit_transform<R, S>(&mut self, rows: &[R]) -> Array2<f32>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let vocabulary: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.as_ref().iter().map(AsRef::as_ref))
            .collect();
        *self = Self::with_features(vocabulary.into_iter().map(str::to_string).collect());
        log::info!("Fitted format vocabulary with {} features", self.dimension());
        self.encode(rows)
    }

    /// Encodes `rows` with the fitted vocabulary.
    pub fn transform<R, S>(&self, rows: &[R]) -> Result<Array2<f32>>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        if !self.fitted {
            return Err(VectorizerError::NotFitted);
        }
        Ok(self.encode(rows))
    }

    pub fn transform_one<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<f32>> {
        let matrix = self.transform(&[tags])?;
        Ok(matrix.row(0).to_vec())
    }

    fn encode<R, S>(&self, rows: &[R]) -> Array2<f32>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let mut matrix = Array2::<f32>::zeros((rows.len(), self.dimension()));
        for (row_idx, row) in rows.iter().enumerate() {
            for tag in row.as_ref() {
                match self.positions.get(tag.as_ref()) {
                    Some(&col) => matrix[[row_idx, col]] = 1.0,
                    None => log::debug!("dropping unseen format {}", tag.as_ref()),
                }
            }
        }
        matrix
    }

    pub fn dimension(&self) -> usize {
        self.features.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.features
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.fitted {
            return Err(VectorizerError::NotFitted);
        }
        let persisted = PersistedVocabulary {
            schema_version: VOCABULARY_SCHEMA_VERSION,
            features: self.features.clone(),
        };
        std::fs::write(path.as_ref(), serde_json::to_vec_pretty(&persisted)?)?;
        log::info!("Vocabulary written to {}", path.as_ref().display());
        Ok(())
    }

    /// Restores a fitted vectorizer from a saved vocabulary.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VectorizerError::MissingFile(path.to_path_buf()));
        }
        let persisted: PersistedVocabulary = serde_json::from_slice(&std::fs::read(path)?)?;
        if persisted.schema_version != VOCABULARY_SCHEMA_VERSION {
            return Err(VectorizerError::UnsupportedSchema {
                expected: VOCABULARY_SCHEMA_VERSION,
                actual: persisted.schema_version,
            });
        }
        Ok(Self::with_features(persisted.features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn sets(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn one_hot_rows_over_sorted_vocabulary() {
        let mut vectorizer = FormatVectorizer::new();
        let matrix = vectorizer.fit_transform(&sets(&[&["Q3", "Q1"], &["Q2", "Q3"]]));
        assert_eq!(vectorizer.vocabulary(), ["Q1", "Q2", "Q3"]);
        assert_eq!(matrix.shape(), &[2, 3]);
        assert_eq!(matrix.row(0).to_vec(), vec![1.0, 0.0, 1.0]);
        assert_eq!(matrix.row(1).to_vec(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn transform_drops_unseen_formats() {
        let mut vectorizer = FormatVectorizer::new();
        vectorizer.fit_transform(&sets(&[&["Q1", "Q2"]]));
        let vector = vectorizer.transform_one(&["Q2", "Q99"]).unwrap();
        assert_eq!(vector, vec![0.0, 1.0]);
        assert_eq!(vectorizer.dimension(), 2, "vocabulary must not grow");
    }

    #[test]
    fn transform_before_fit_is_an_error() {
        let vectorizer = FormatVectorizer::new();
        assert!(matches!(
            vectorizer.transform_one(&["Q1"]),
            Err(VectorizerError::NotFitted)
        ));
    }

    #[test]
    fn refit_replaces_vocabulary() {
        let mut vectorizer = FormatVectorizer::new();
        vectorizer.fit_transform(&sets(&[&["Q1", "Q2", "Q3"]]));
        vectorizer.fit_transform(&sets(&[&["Q9"]]));
        assert_eq!(vectorizer.vocabulary(), ["Q9"]);
    }

    #[test]
    fn saved_vocabulary_reproduces_vectors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("vocabulary.json");
        let mut fitted = FormatVectorizer::new();
        fitted.fit_transform(&sets(&[&["Q5", "Q1"], &["Q7"]]));
        fitted.save(&path).unwrap();

        let restored = FormatVectorizer::load(&path).unwrap();
        let query = ["Q7", "Q1", "Q8"];
        assert_eq!(
            restored.transform_one(&query).unwrap(),
            fitted.transform_one(&query).unwrap()
        );
    }

    proptest! {
        #[test]
        fn transform_width_matches_fit_width(
            fit in prop::collection::vec(prop::collection::vec(0u16..40, 0..8), 1..6),
            query in prop::collection::vec(prop::collection::vec(0u16..80, 0..8), 0..6),
        ) {
            let to_tags = |rows: &Vec<Vec<u16>>| -> Vec<Vec<String>> {
                rows.iter().map(|r| r.iter().map(|n| format!("Q{n}")).collect()).collect()
            };
            let mut vectorizer = FormatVectorizer::new();
            let fitted = vectorizer.fit_transform(&to_tags(&fit));
            let transformed = vectorizer.transform(&to_tags(&query)).unwrap();
            prop_assert_eq!(fitted.ncols(), transformed.ncols());
            prop_assert_eq!(transformed.nrows(), query.len());
            prop_assert!(transformed.iter().all(|v| *v == 0.0 || *v == 1.0));
        }
    }
}
