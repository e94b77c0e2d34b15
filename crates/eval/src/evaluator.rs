use crate::corpus::ImageCorpus;
use crate::error::{EvalError, Result};
use crate::identification::IdentificationReport;
use crate::matrix::{PerformanceMatrix, ScoringMode};
use envrec_search::{EnvironmentIndex, SearchBackend, SearchHit};
use envrec_vectorizer::FormatVectorizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the detected formats of an image become queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStrategy {
    /// One keyword query per file, using its top-ranked format.
    PerFileBestMatch,
    /// One combined query over the distinct top-ranked formats of the image.
    WholeImageBestMatch,
    /// One combined query over every candidate format of the image.
    WholeImageAllMatches,
    /// One nearest-neighbour query with the one-hot vector of every candidate format.
    Vector,
}

impl QueryStrategy {
    pub const ALL: [QueryStrategy; 4] = [
        Self::PerFileBestMatch,
        Self::WholeImageBestMatch,
        Self::WholeImageAllMatches,
        Self::Vector,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerFileBestMatch => "per_file_best_match",
            Self::WholeImageBestMatch => "whole_image_best_match",
            Self::WholeImageAllMatches => "whole_image_all_matches",
            Self::Vector => "vector",
        }
    }
}

impl fmt::Display for QueryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|s| s.as_str()).collect();
                format!("unknown strategy '{s}' (expected one of {})", known.join(", "))
            })
    }
}

impl FromStr for ScoringMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "winner_take_all" => Ok(Self::WinnerTakeAll),
            "cumulative" => Ok(Self::Cumulative),
            other => Err(format!(
                "unknown scoring mode '{other}' (expected winner_take_all or cumulative)"
            )),
        }
    }
}

/// Outcome of evaluating a corpus with one strategy.
#[derive(Debug, Clone)]
pub struct StrategyRun {
    pub strategy: QueryStrategy,
    pub matrix: PerformanceMatrix,
    pub images: usize,
    pub queries: usize,
}

/// Queries the environment collections for each identified image and scores the hits.
pub struct Evaluator<'a, B: SearchBackend + ?Sized> {
    index: EnvironmentIndex<'a, B>,
    vectorizer: Option<&'a FormatVectorizer>,
    mode: ScoringMode,
}

impl<'a, B: SearchBackend + ?Sized> Evaluator<'a, B> {
    pub fn new(index: EnvironmentIndex<'a, B>, mode: ScoringMode) -> Self {
        Self {
            index,
            vectorizer: None,
            mode,
        }
    }

    /// Vocabulary used by [`QueryStrategy::Vector`]; must be the one the vector collection was
    /// built with.
    #[must_use]
    pub fn with_vectorizer(mut self, vectorizer: &'a FormatVectorizer) -> Self {
        self.vectorizer = Some(vectorizer);
        self
    }

    /// Runs the queries of one image and applies their hits to `matrix`. Returns the number of
    /// queries sent; images without detected formats send none.
    pub async fn evaluate_image(
        &self,
        report: &IdentificationReport,
        strategy: QueryStrategy,
        matrix: &mut PerformanceMatrix,
    ) -> Result<usize> {
        match strategy {
            QueryStrategy::PerFileBestMatch => {
                let formats = report.best_matches();
                for format in &formats {
                    let hits = self.index.match_format(format).await?;
                    self.score(matrix, &hits)?;
                }
                Ok(formats.len())
            }
            QueryStrategy::WholeImageBestMatch => {
                self.combined(&report.unique_best_matches(), matrix).await
            }
            QueryStrategy::WholeImageAllMatches => {
                self.combined(&report.all_matches(), matrix).await
            }
            QueryStrategy::Vector => {
                let vectorizer = self.vectorizer.ok_or(EvalError::MissingVectorizer)?;
                let formats = report.all_matches();
                if formats.is_empty() {
                    log::debug!("no detected formats, skipping vector query");
                    return Ok(0);
                }
                let vector = vectorizer.transform_one(&formats)?;
                if vector.iter().all(|&v| v == 0.0) {
                    log::warn!(
                        "none of {} detected formats is in the vocabulary, skipping vector query",
                        formats.len()
                    );
                    return Ok(0);
                }
                let hits = self.index.nearest(&vector).await?;
                self.score(matrix, &hits)?;
                Ok(1)
            }
        }
    }

    async fn combined(&self, formats: &[String], matrix: &mut PerformanceMatrix) -> Result<usize> {
        if formats.is_empty() {
            log::debug!("no detected formats, skipping query");
            return Ok(0);
        }
        let hits = self.index.match_formats(formats).await?;
        self.score(matrix, &hits)?;
        Ok(1)
    }

    fn score(&self, matrix: &mut PerformanceMatrix, hits: &[SearchHit]) -> Result<()> {
        if let Some(top) = hits.first() {
            log::debug!("top hit {} ({:.3}) of {}", top.machine, top.score, hits.len());
        }
        matrix.calculate_score(hits, self.mode)
    }

    /// Evaluates every image of `corpus` once per strategy, each strategy on its own copy of
    /// `layout`.
    pub async fn evaluate_corpus(
        &self,
        corpus: &ImageCorpus,
        strategies: &[QueryStrategy],
        layout: &PerformanceMatrix,
    ) -> Result<Vec<StrategyRun>> {
        let fitted = self.vectorizer.is_some_and(FormatVectorizer::is_fitted);
        if strategies.contains(&QueryStrategy::Vector) && !fitted {
            return Err(EvalError::MissingVectorizer);
        }

        let mut runs = Vec::with_capacity(strategies.len());
        for &strategy in strategies {
            log::info!("Evaluating {} images with {strategy}", corpus.len());
            let mut run = StrategyRun {
                strategy,
                matrix: layout.clone(),
                images: 0,
                queries: 0,
            };
            for (path, report) in corpus.images() {
                log::debug!("evaluating {}", path.display());
                run.queries += self.evaluate_image(report, strategy, &mut run.matrix).await?;
                run.images += 1;
            }
            log::info!(
                "{strategy}: {} queries over {} images, Total = {}",
                run.queries,
                run.images,
                run.matrix.total()
            );
            runs.push(run);
        }
        Ok(runs)
    }
}
