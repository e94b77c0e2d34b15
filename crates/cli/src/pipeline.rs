//! The recommender pipeline: catalog, environments and vectors, index loading, evaluation.
//!
//! Every stage reads the files of the previous one from the work directory, so stages can run
//! as separate processes.

use crate::config::Settings;
use anyhow::{bail, Context, Result};
use envrec_catalog::{FormatCatalog, FormatUsers, WikiClient};
use envrec_environments::bulk::{self, BulkEntry, FormatDocument, VectorDocument};
use envrec_environments::{
    load_definitions, member_applications, reference_definitions, EnvironmentBuilder,
    EnvironmentDefinition, EnvironmentSnapshot, RandomEnvironmentSampler, RandomSource,
};
use envrec_eval::{Evaluator, ImageCorpus, PerformanceMatrix, QueryStrategy, ScoringMode, Summary};
use envrec_search::{
    query, EnvironmentIndex, OpenSearchClient, SearchBackend, SearchHit, VECTOR_FIELD,
};
use envrec_vectorizer::FormatVectorizer;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const REFERENCE_ENVS_FILE: &str = "reference_envs.json";
pub const RANDOM_ENVS_FILE: &str = "random_envs.json";
pub const ENVS_FOR_KNN_FILE: &str = "envs_for_knn.json";
pub const KNN_ENVS_FILE: &str = "knn_envs.json";
pub const KNN_SETUP_FILE: &str = "knn_envs_setup.json";
pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const FORMAT_COUNTS_FILE: &str = "uniqueid_counts.json";

/// Bulk files in load order.
pub const BULK_FILES: [&str; 3] = [REFERENCE_ENVS_FILE, RANDOM_ENVS_FILE, KNN_ENVS_FILE];

pub fn summary_file_name(strategy: QueryStrategy) -> String {
    format!("summary_{strategy}.json")
}

fn definitions(settings: &Settings) -> Result<Vec<EnvironmentDefinition>> {
    match &settings.paths.reference_envs {
        Some(path) => load_definitions(path)
            .with_context(|| format!("Failed to load environment definitions {}", path.display())),
        None => Ok(reference_definitions()),
    }
}

/// Fetches the catalog entries of `tags` (the reference members when empty) and saves it.
pub async fn scrape(settings: &Settings, tags: &[String], out: &Path) -> Result<FormatCatalog> {
    let tags = if tags.is_empty() {
        member_applications(&definitions(settings)?)
    } else {
        tags.to_vec()
    };
    let client = WikiClient::new(&settings.wiki)?;
    let catalog = client
        .build_catalog(&tags)
        .await
        .context("Catalog scrape failed")?;
    catalog
        .save(out)
        .with_context(|| format!("Failed to write catalog {}", out.display()))?;
    Ok(catalog)
}

/// Applications reading/writing `format`, from the saved catalog or from the wiki.
pub async fn lookup(settings: &Settings, format: &str, remote: bool) -> Result<FormatUsers> {
    if remote {
        let client = WikiClient::new(&settings.wiki)?;
        return Ok(client.applications_supporting(format).await?);
    }
    let catalog = FormatCatalog::load(&settings.paths.catalog)?;
    Ok(FormatUsers {
        format: format.to_string(),
        readers: catalog
            .applications_reading(format)
            .into_iter()
            .map(str::to_string)
            .collect(),
        writers: catalog
            .applications_writing(format)
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// Writes the format occurrence counts of the corpus and returns its distinct formats.
pub fn observed_formats(settings: &Settings) -> Result<Vec<String>> {
    let corpus = ImageCorpus::scan(&settings.paths.data_dir)?;
    corpus.write_format_counts(settings.work_file(FORMAT_COUNTS_FILE))?;
    let formats = corpus.unique_formats();
    log::info!(
        "{} distinct formats across {} images",
        formats.len(),
        corpus.len()
    );
    Ok(formats)
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub reference: usize,
    pub random: usize,
    pub dimension: usize,
    pub work_dir: PathBuf,
}

/// Resolves every environment and writes the bulk, snapshot, index setup and vocabulary files.
pub fn build(settings: &Settings) -> Result<BuildReport> {
    let work_dir = &settings.paths.work_dir;
    std::fs::create_dir_all(work_dir)
        .with_context(|| format!("Failed to create work directory {}", work_dir.display()))?;

    let catalog = FormatCatalog::load(&settings.paths.catalog)
        .with_context(|| format!("Failed to load catalog {}", settings.paths.catalog.display()))?;
    let builder = EnvironmentBuilder::new(&catalog);

    let reference = builder.build(&definitions(settings)?, 1)?;
    bulk::write_bulk_file(
        settings.work_file(REFERENCE_ENVS_FILE),
        &settings.search.keyword_index,
        &bulk::format_entries(&reference),
    )?;

    let mut sampler = RandomEnvironmentSampler::new(&settings.sampling, reference.len());
    let random = match settings.sampling.source {
        RandomSource::ObservedFormats => sampler.sample_formats(&observed_formats(settings)?)?,
        RandomSource::CatalogApplications => {
            if settings.paths.data_dir.is_dir() {
                observed_formats(settings)?;
            }
            let sampled = sampler.sample_definitions(&catalog)?;
            builder.build(&sampled, sampler.first_id())?
        }
    };
    bulk::write_bulk_file(
        settings.work_file(RANDOM_ENVS_FILE),
        &settings.search.keyword_index,
        &bulk::format_entries(&random),
    )?;

    let snapshot = EnvironmentSnapshot::new(&reference, &random);
    snapshot.save(settings.work_file(ENVS_FOR_KNN_FILE))?;

    let mut vectorizer = FormatVectorizer::new();
    let vectors = vectorizer.fit_transform(&snapshot.format_sets());
    let entries: Vec<BulkEntry<VectorDocument>> = reference
        .iter()
        .chain(&random)
        .zip(vectors.rows())
        .map(|(env, row)| BulkEntry {
            id: env.id,
            document: VectorDocument {
                machine: env.name.clone(),
                fformats_vector: row.to_vec(),
            },
        })
        .collect();
    bulk::write_bulk_file(
        settings.work_file(KNN_ENVS_FILE),
        &settings.search.vector_index,
        &entries,
    )?;

    let setup = query::knn_index_settings(VECTOR_FIELD, vectorizer.dimension());
    std::fs::write(
        settings.work_file(KNN_SETUP_FILE),
        serde_json::to_string(&setup)?,
    )?;
    vectorizer.save(settings.work_file(VOCABULARY_FILE))?;

    Ok(BuildReport {
        reference: reference.len(),
        random: random.len(),
        dimension: vectorizer.dimension(),
        work_dir: work_dir.clone(),
    })
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub vector_index_created: bool,
    pub documents: usize,
    pub rejected_files: Vec<String>,
}

/// Creates the vector collection and bulk loads the generated files, optionally deleting both
/// collections first.
pub async fn load(settings: &Settings, reset: bool) -> Result<LoadReport> {
    let client = OpenSearchClient::new(&settings.search)?;
    let index = EnvironmentIndex::new(&client, &settings.search);
    if reset {
        index.reset().await?;
    }

    let setup_path = settings.work_file(KNN_SETUP_FILE);
    let setup: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(&setup_path)
            .with_context(|| format!("Failed to read {}", setup_path.display()))?,
    )?;
    let mut report = LoadReport {
        vector_index_created: index.create_vector_index(&setup).await?,
        ..LoadReport::default()
    };

    for name in BULK_FILES {
        let path = settings.work_file(name);
        let ndjson = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let documents = bulk::decode::<serde_json::Value>(&ndjson)
            .with_context(|| format!("Malformed bulk file {}", path.display()))?
            .len();
        log::info!("Loading {documents} documents from {name}");
        let outcome = index.bulk_load(ndjson).await?;
        if outcome.accepted && !outcome.errors {
            report.documents += documents;
        } else {
            report.rejected_files.push(name.to_string());
        }
    }
    Ok(report)
}

/// Environment names of one keyword bulk file, in file order.
fn environment_names(settings: &Settings, file: &str) -> Result<Vec<String>> {
    let entries = bulk::read_bulk_file::<FormatDocument>(settings.work_file(file))?;
    Ok(entries.into_iter().map(|(_, doc)| doc.machine).collect())
}

/// The vector collection is built from the snapshot, so it must describe as many reference
/// and random environments as the keyword bulk files.
fn check_snapshot(settings: &Settings, reference: usize, random: usize) -> Result<()> {
    let path = settings.work_file(ENVS_FOR_KNN_FILE);
    let snapshot = EnvironmentSnapshot::load(&path)?;
    if snapshot.reference_count() != reference || snapshot.random_count() != random {
        bail!(
            "{} holds {} reference and {} random environments, the bulk files {reference} and \
             {random}; rerun build",
            path.display(),
            snapshot.reference_count(),
            snapshot.random_count()
        );
    }
    Ok(())
}

/// Evaluates the corpus once per strategy and writes one summary per strategy to `out_dir`.
pub async fn evaluate(
    settings: &Settings,
    strategies: &[QueryStrategy],
    scoring: ScoringMode,
    out_dir: &Path,
) -> Result<Vec<(QueryStrategy, Summary)>> {
    if strategies.is_empty() {
        bail!("No evaluation strategy selected");
    }
    let corpus = ImageCorpus::scan(&settings.paths.data_dir)?;
    let reference = environment_names(settings, REFERENCE_ENVS_FILE)?;
    let random = environment_names(settings, RANDOM_ENVS_FILE)?;

    let vectorizer = if strategies.contains(&QueryStrategy::Vector) {
        check_snapshot(settings, reference.len(), random.len())?;
        Some(FormatVectorizer::load(settings.work_file(VOCABULARY_FILE))?)
    } else {
        None
    };
    let names: Vec<&String> = reference.iter().chain(&random).collect();
    let layout = PerformanceMatrix::new(&names);

    let client = OpenSearchClient::new(&settings.search)?;
    let mut evaluator = Evaluator::new(EnvironmentIndex::new(&client, &settings.search), scoring);
    if let Some(vectorizer) = &vectorizer {
        evaluator = evaluator.with_vectorizer(vectorizer);
    }

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    let runs = evaluator.evaluate_corpus(&corpus, strategies, &layout).await?;
    let mut summaries = Vec::with_capacity(runs.len());
    for run in runs {
        let summary = Summary::from_matrix(&run.matrix);
        summary.save(out_dir.join(summary_file_name(run.strategy)))?;
        log::info!("{}: {} images evaluated", run.strategy, run.images);
        summary.category_totals().log();
        summaries.push((run.strategy, summary));
    }
    Ok(summaries)
}

/// One match query against the keyword collection.
pub async fn query_term(settings: &Settings, field: &str, term: &str) -> Result<Vec<SearchHit>> {
    let client = OpenSearchClient::new(&settings.search)?;
    Ok(client
        .search(&settings.search.keyword_index, &query::match_query(field, term))
        .await?)
}

pub async fn delete_index(settings: &Settings, name: &str) -> Result<bool> {
    let client = OpenSearchClient::new(&settings.search)?;
    Ok(client.delete_index(name).await?)
}
