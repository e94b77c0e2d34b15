use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Formats an application can open and save, as knowledge-graph tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSupport {
    #[serde(default)]
    pub read_formats: Vec<String>,
    #[serde(default)]
    pub write_formats: Vec<String>,
}

impl FormatSupport {
    pub fn reads(&self, format: &str) -> bool {
        self.read_formats.iter().any(|f| f == format)
    }

    pub fn writes(&self, format: &str) -> bool {
        self.write_formats.iter().any(|f| f == format)
    }
}

/// Catalog entry for a single application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub tag: String,
    pub support: FormatSupport,
}

/// Mapping from application tag to the formats it supports.
///
/// Persisted as `{"<tag>": {"read_formats": [...], "write_formats": [...]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatCatalog {
    applications: BTreeMap<String, FormatSupport>,
}

impl FormatCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, application: Application) {
        self.applications
            .insert(application.tag, application.support);
    }

    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&FormatSupport> {
        self.applications.get(tag)
    }

    /// Read formats of `tag`; a tag missing from the catalog is an error.
    pub fn read_formats(&self, tag: &str) -> Result<&[String]> {
        self.applications
            .get(tag)
            .map(|support| support.read_formats.as_slice())
            .ok_or_else(|| CatalogError::UnknownApplication(tag.to_string()))
    }

    pub fn application_tags(&self) -> impl Iterator<Item = &str> {
        self.applications.keys().map(String::as_str)
    }

    pub fn applications(&self) -> impl Iterator<Item = (&str, &FormatSupport)> {
        self.applications
            .iter()
            .map(|(tag, support)| (tag.as_str(), support))
    }

    #[must_use]
    pub fn applications_reading(&self, format: &str) -> Vec<&str> {
        self.applications()
            .filter(|(_, support)| support.reads(format))
            .map(|(tag, _)| tag)
            .collect()
    }

    #[must_use]
    pub fn applications_writing(&self, format: &str) -> Vec<&str> {
        self.applications()
            .filter(|(_, support)| support.writes(format))
            .map(|(tag, _)| tag)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.applications.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::error!("{} does not exist", path.display());
            return Err(CatalogError::MissingFile(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&raw)?;
        log::info!(
            "Loaded {} applications from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        log::info!("Application mapping written to {}", path.display());
        Ok(())
    }
}

impl FromIterator<Application> for FormatCatalog {
    fn from_iter<T: IntoIterator<Item = Application>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for application in iter {
            catalog.insert(application);
        }
        catalog
    }
}

/// Keeps only the tags that occur exactly once, in their original order.
#[must_use]
pub fn singletons<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in tags {
        *counts.entry(tag.as_ref()).or_insert(0) += 1;
    }
    tags.iter()
        .map(AsRef::as_ref)
        .filter(|tag| counts.get(tag) == Some(&1))
        .map(str::to_string)
        .collect()
}
