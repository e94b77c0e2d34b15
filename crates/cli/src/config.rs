use anyhow::{Context, Result};
use envrec_catalog::WikiConfig;
use envrec_environments::SamplingConfig;
use envrec_eval::{QueryStrategy, ScoringMode};
use envrec_search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "envrec.toml";

const ENV_OVERRIDES: [&str; 4] = [
    "ENVREC_SEARCH_URL",
    "ENVREC_SEARCH_USERNAME",
    "ENVREC_SEARCH_PASSWORD",
    "ENVREC_WIKI_URL",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub scoring: ScoringMode,
    pub strategies: Vec<QueryStrategy>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringMode::WinnerTakeAll,
            strategies: vec![QueryStrategy::WholeImageAllMatches, QueryStrategy::Vector],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory receiving every generated file.
    pub work_dir: PathBuf,
    /// Identification reports of the test images.
    pub data_dir: PathBuf,
    pub catalog: PathBuf,
    /// Definitions replacing the built-in reference environments.
    pub reference_envs: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            data_dir: PathBuf::from("sfdata2"),
            catalog: PathBuf::from("app2fformats.json"),
            reference_envs: None,
        }
    }
}

/// Contents of `envrec.toml`; every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub search: SearchConfig,
    pub sampling: SamplingConfig,
    pub evaluation: EvaluationConfig,
    pub paths: PathsConfig,
    pub wiki: WikiConfig,
}

impl Settings {
    /// `explicit` must exist; otherwise `./envrec.toml` is used when present. Environment
    /// overrides are applied last.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                log::debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                Self::default()
            }
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let settings = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(settings)
    }

    /// Applies `ENVREC_*` values returned by `lookup`. Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in ENV_OVERRIDES {
            let Some(value) = lookup(key).map(|v| v.trim().to_string()) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            let target = match key {
                "ENVREC_SEARCH_URL" => &mut self.search.url,
                "ENVREC_SEARCH_USERNAME" => &mut self.search.username,
                "ENVREC_SEARCH_PASSWORD" => &mut self.search.password,
                _ => &mut self.wiki.base_url,
            };
            *target = value;
        }
    }

    pub fn work_file(&self, name: &str) -> PathBuf {
        self.paths.work_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envrec_environments::RandomSource;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("envrec.toml");
        std::fs::write(
            &path,
            r#"
[search]
url = "http://search:9200"
knn_size = 8

[sampling]
source = "catalog_applications"
seed = 7

[evaluation]
scoring = "cumulative"
strategies = ["per_file_best_match"]
"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.search.url, "http://search:9200");
        assert_eq!(settings.search.knn_size, 8);
        assert_eq!(settings.search.keyword_index, "environments");
        assert_eq!(settings.sampling.source, RandomSource::CatalogApplications);
        assert_eq!(settings.sampling.seed, Some(7));
        assert_eq!(settings.sampling.random_count, 16);
        assert_eq!(settings.evaluation.scoring, ScoringMode::Cumulative);
        assert_eq!(
            settings.evaluation.strategies,
            vec![QueryStrategy::PerFileBestMatch]
        );
        assert_eq!(settings.paths, PathsConfig::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(Settings::resolve(Some(&tmp.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn environment_overrides_connection_settings() {
        let mut settings = Settings::default();
        settings.apply_overrides(|key| match key {
            "ENVREC_SEARCH_URL" => Some("http://127.0.0.1:9999".to_string()),
            "ENVREC_SEARCH_PASSWORD" => Some("  ".to_string()),
            "ENVREC_WIKI_URL" => Some("http://wiki.local".to_string()),
            _ => None,
        });
        assert_eq!(settings.search.url, "http://127.0.0.1:9999");
        assert_eq!(settings.search.password, "admin");
        assert_eq!(settings.wiki.base_url, "http://wiki.local");
    }
}
