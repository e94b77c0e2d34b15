use crate::error::{EnvironmentError, Result};
use envrec_catalog::{singletons, FormatCatalog};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const REFERENCE_MARKER: &str = "ref_env";
pub const RANDOM_MARKER: &str = "rand_env";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    Reference,
    Random,
}

impl EnvironmentKind {
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Reference => REFERENCE_MARKER,
            Self::Random => RANDOM_MARKER,
        }
    }

    /// `ref_env_<id>` / `rand_env_<id>`
    pub fn name(self, id: usize) -> String {
        format!("{}_{id}", self.marker())
    }

    /// Category of an environment name, by marker.
    pub fn classify(name: &str) -> Option<Self> {
        if name.contains(REFERENCE_MARKER) {
            Some(Self::Reference)
        } else if name.contains(RANDOM_MARKER) {
            Some(Self::Random)
        } else {
            None
        }
    }
}

/// Named set of member applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDefinition {
    pub name: String,
    pub applications: Vec<String>,
}

impl EnvironmentDefinition {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        applications: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            applications: applications.into_iter().map(Into::into).collect(),
        }
    }
}

/// An environment resolved to the formats it can read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Bulk-load document id.
    pub id: usize,
    pub name: String,
    pub formats: Vec<String>,
}

const REFERENCE_ENVIRONMENTS: [&[&str]; 4] = [
    &[
        "Q18168774", "Q11261", "Q29482", "Q18698690", "Q10393867", "Q134067", "Q862505",
        "Q11255", "Q11272", "Q80689", "Q60693055", "Q129793",
    ],
    &[
        "Q11215", "Q171477", "Q29482", "Q698", "Q171477", "Q11261", "Q11255", "Q11272",
        "Q11266", "Q60691254",
    ],
    &[
        "Q381", "Q698", "Q207902", "Q8041", "Q171477", "Q131382", "Q6930567", "Q862505",
        "Q10135", "Q3774510", "Q319417", "Q8038", "Q201809",
    ],
    &[
        "Q17107792", "Q698", "Q9589", "Q70060004", "Q60693055", "Q862505", "Q11272", "Q11266",
        "Q129793",
    ],
];

/// The fixed reference environments `ref_env_1..=4`.
pub fn reference_definitions() -> Vec<EnvironmentDefinition> {
    REFERENCE_ENVIRONMENTS
        .iter()
        .enumerate()
        .map(|(idx, apps)| {
            let name = EnvironmentKind::Reference.name(idx + 1);
            EnvironmentDefinition::new(name, apps.iter().copied())
        })
        .collect()
}

/// Distinct member applications across `definitions`, in first-seen order.
pub fn member_applications(definitions: &[EnvironmentDefinition]) -> Vec<String> {
    let mut seen = HashSet::new();
    definitions
        .iter()
        .flat_map(|def| def.applications.iter())
        .filter(|app| seen.insert(app.as_str()))
        .cloned()
        .collect()
}

/// Loads `{"<name>": ["<app tag>", ...], ...}`, keeping file order.
pub fn load_definitions(path: impl AsRef<Path>) -> Result<Vec<EnvironmentDefinition>> {
    let path = path.as_ref();
    if !path.exists() {
        log::error!("{} does not exist", path.display());
        return Err(EnvironmentError::MissingFile(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)?;
    map.into_iter()
        .map(|(name, apps)| {
            let applications: Vec<String> = serde_json::from_value(apps)?;
            Ok(EnvironmentDefinition { name, applications })
        })
        .collect()
}

/// Resolves definitions against the application catalog.
pub struct EnvironmentBuilder<'a> {
    catalog: &'a FormatCatalog,
}

impl<'a> EnvironmentBuilder<'a> {
    pub fn new(catalog: &'a FormatCatalog) -> Self {
        Self { catalog }
    }

    /// Read formats supported by exactly one member application.
    ///
    /// Members listed more than once count once; each member's own list is deduplicated first.
    pub fn resolve(&self, definition: &EnvironmentDefinition) -> Result<Vec<String>> {
        let mut members = HashSet::new();
        let mut pooled: Vec<&str> = Vec::new();
        for app in &definition.applications {
            if !members.insert(app.as_str()) {
                continue;
            }
            let formats = self.catalog.read_formats(app).map_err(|_| {
                log::error!(
                    "Application {app} of {} is missing from the catalog",
                    definition.name
                );
                EnvironmentError::UnknownApplication {
                    environment: definition.name.clone(),
                    application: app.clone(),
                }
            })?;
            let mut own = HashSet::new();
            pooled.extend(
                formats
                    .iter()
                    .map(String::as_str)
                    .filter(|format| own.insert(*format)),
            );
        }
        Ok(singletons(&pooled))
    }

    /// Resolves every definition; ids are assigned from `first_id` in order.
    pub fn build(
        &self,
        definitions: &[EnvironmentDefinition],
        first_id: usize,
    ) -> Result<Vec<Environment>> {
        definitions
            .iter()
            .enumerate()
            .map(|(offset, definition)| {
                let formats = self.resolve(definition)?;
                log::debug!("{} resolves to {} formats", definition.name, formats.len());
                Ok(Environment {
                    id: first_id + offset,
                    name: definition.name.clone(),
                    formats,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envrec_catalog::{Application, FormatSupport};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn catalog(entries: &[(&str, &[&str])]) -> FormatCatalog {
        entries
            .iter()
            .map(|(tag, read)| Application {
                tag: tag.to_string(),
                support: FormatSupport {
                    read_formats: read.iter().map(|s| s.to_string()).collect(),
                    write_formats: Vec::new(),
                },
            })
            .collect()
    }

    #[test]
    fn names_and_categories() {
        assert_eq!(EnvironmentKind::Reference.name(2), "ref_env_2");
        assert_eq!(EnvironmentKind::Random.name(5), "rand_env_5");
        assert_eq!(EnvironmentKind::classify("rand_env_17"), Some(EnvironmentKind::Random));
        assert_eq!(EnvironmentKind::classify("ref_env_1"), Some(EnvironmentKind::Reference));
        assert_eq!(EnvironmentKind::classify("Total"), None);
    }

    #[test]
    fn formats_shared_by_two_members_are_excluded() {
        let catalog = catalog(&[("A1", &["x", "y"]), ("A2", &["y", "z"])]);
        let builder = EnvironmentBuilder::new(&catalog);
        let env = EnvironmentDefinition::new("ref_env_1", ["A1", "A2"]);
        assert_eq!(builder.resolve(&env).unwrap(), vec!["x", "z"]);
    }

    #[test]
    fn dedup_is_per_environment() {
        let catalog = catalog(&[("A", &["x", "y"]), ("B", &["y", "z"])]);
        let builder = EnvironmentBuilder::new(&catalog);
        let envs = builder
            .build(
                &[
                    EnvironmentDefinition::new("ref_env_1", ["A"]),
                    EnvironmentDefinition::new("ref_env_2", ["B"]),
                ],
                1,
            )
            .unwrap();
        assert_eq!(envs[0].formats, vec!["x", "y"]);
        assert_eq!(envs[1].formats, vec!["y", "z"]);
        assert_eq!((envs[0].id, envs[1].id), (1, 2));
    }

    #[test]
    fn repeated_member_counts_once() {
        let catalog = catalog(&[("A", &["x", "x", "y"])]);
        let builder = EnvironmentBuilder::new(&catalog);
        let env = EnvironmentDefinition::new("ref_env_1", ["A", "A"]);
        assert_eq!(builder.resolve(&env).unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn unknown_application_aborts_the_build() {
        let catalog = catalog(&[("A", &["x"])]);
        let builder = EnvironmentBuilder::new(&catalog);
        let err = builder
            .build(&[EnvironmentDefinition::new("ref_env_3", ["A", "B"])], 1)
            .unwrap_err();
        match err {
            EnvironmentError::UnknownApplication {
                environment,
                application,
            } => {
                assert_eq!(environment, "ref_env_3");
                assert_eq!(application, "B");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reference_definitions_are_numbered_from_one() {
        let defs = reference_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["ref_env_1", "ref_env_2", "ref_env_3", "ref_env_4"]);
        let members = member_applications(&defs);
        assert_eq!(members.iter().filter(|m| *m == "Q171477").count(), 1);
    }

    #[test]
    fn definitions_file_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("envs.json");
        std::fs::write(
            &path,
            r#"{"rand_env_10": ["A"], "rand_env_5": ["B", "C"]}"#,
        )
        .unwrap();
        let defs = load_definitions(&path).unwrap();
        assert_eq!(defs[0].name, "rand_env_10");
        assert_eq!(defs[1].applications, vec!["B", "C"]);

        assert!(matches!(
            load_definitions(tmp.path().join("missing.json")),
            Err(EnvironmentError::MissingFile(_))
        ));
    }

    proptest! {
        #[test]
        fn no_format_read_by_two_members_survives(
            apps in prop::collection::vec(prop::collection::vec(0u8..12, 0..6), 1..6)
        ) {
            let entries: Vec<(String, Vec<String>)> = apps
                .iter()
                .enumerate()
                .map(|(i, formats)| {
                    let read: Vec<String> = formats.iter().map(|f| format!("Q{f}")).collect();
                    (format!("A{i}"), read)
                })
                .collect();
            let catalog: FormatCatalog = entries
                .iter()
                .map(|(tag, read)| Application {
                    tag: tag.clone(),
                    support: FormatSupport {
                        read_formats: read.clone(),
                        write_formats: Vec::new(),
                    },
                })
                .collect();
            let def =
                EnvironmentDefinition::new("rand_env_1", entries.iter().map(|(t, _)| t.clone()));
            let formats = EnvironmentBuilder::new(&catalog).resolve(&def).unwrap();

            for format in &formats {
                let readers = entries.iter().filter(|(_, read)| read.contains(format)).count();
                prop_assert_eq!(readers, 1);
            }
            for (_, read) in &entries {
                for format in read {
                    let readers = entries.iter().filter(|(_, r)| r.contains(format)).count();
                    prop_assert_eq!(readers == 1, formats.contains(format));
                }
            }
        }
    }
}
