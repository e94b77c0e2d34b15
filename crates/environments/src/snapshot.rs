use crate::definition::Environment;
use crate::error::{EnvironmentError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format lists of every environment, reference first, as fed to the vectorizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub ref_envs: Vec<Vec<String>>,
    pub rand_envs: Vec<Vec<String>>,
}

impl EnvironmentSnapshot {
    pub fn new(reference: &[Environment], random: &[Environment]) -> Self {
        Self {
            ref_envs: reference.iter().map(|e| e.formats.clone()).collect(),
            rand_envs: random.iter().map(|e| e.formats.clone()).collect(),
        }
    }

    /// Reference lists followed by random lists.
    pub fn format_sets(&self) -> Vec<&[String]> {
        self.ref_envs
            .iter()
            .chain(&self.rand_envs)
            .map(Vec::as_slice)
            .collect()
    }

    pub fn reference_count(&self) -> usize {
        self.ref_envs.len()
    }

    pub fn random_count(&self) -> usize {
        self.rand_envs.len()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::error!("{} does not exist", path.display());
            return Err(EnvironmentError::MissingFile(path.to_path_buf()));
        }
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, serde_json::to_string(self)?)?;
        log::info!("Environment snapshot written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn snapshot_roundtrip_keeps_reference_first() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("envs_for_knn.json");
        let reference = vec![Environment {
            id: 1,
            name: "ref_env_1".into(),
            formats: vec!["Q1".into()],
        }];
        let random = vec![Environment {
            id: 2,
            name: "rand_env_2".into(),
            formats: vec!["Q2".into(), "Q3".into()],
        }];
        EnvironmentSnapshot::new(&reference, &random)
            .save(&path)
            .unwrap();

        let loaded = EnvironmentSnapshot::load(&path).unwrap();
        assert_eq!(loaded.reference_count(), 1);
        assert_eq!(loaded.random_count(), 1);
        let sets = loaded.format_sets();
        assert_eq!(sets[0], ["Q1".to_string()]);
        assert_eq!(sets[1].len(), 2);
    }
}
