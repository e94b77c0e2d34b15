use crate::error::{EvalError, Result};
use envrec_search::SearchHit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key holding the number of scored queries.
pub const TOTAL_KEY: &str = "Total";

/// How query hits turn into points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// One point to the top-ranked environment and one to `Total`.
    #[default]
    WinnerTakeAll,
    /// Every hit adds its relevance score to its environment.
    Cumulative,
}

/// Accumulated score per environment, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMatrix {
    entries: Vec<(String, f64)>,
    positions: HashMap<String, usize>,
}

impl PerformanceMatrix {
    /// A zeroed matrix with `Total` first, then `names` in order. Repeated names are kept once.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        let mut matrix = Self {
            entries: Vec::with_capacity(names.len() + 1),
            positions: HashMap::with_capacity(names.len() + 1),
        };
        matrix.push(TOTAL_KEY);
        for name in names {
            matrix.push(name.as_ref());
        }
        matrix
    }

    /// `Total`, `ref_env_1..=reference`, then the random environments numbered after them.
    #[cfg(test)]
    pub(crate) fn for_layout(reference: usize, random: usize) -> Self {
        use envrec_environments::EnvironmentKind;

        let names: Vec<String> = (1..=reference)
            .map(|id| EnvironmentKind::Reference.name(id))
            .chain((reference + 1..=reference + random).map(|id| EnvironmentKind::Random.name(id)))
            .collect();
        Self::new(&names)
    }

    fn push(&mut self, name: &str) {
        if !self.positions.contains_key(name) {
            self.positions.insert(name.to_string(), self.entries.len());
            self.entries.push((name.to_string(), 0.0));
        }
    }

    pub fn score(&self, name: &str) -> Option<f64> {
        self.positions.get(name).map(|&i| self.entries[i].1)
    }

    pub fn total(&self) -> f64 {
        self.score(TOTAL_KEY).unwrap_or(0.0)
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    /// Applies one query's ranked hits. Empty hits leave the matrix unchanged; a hit naming an
    /// environment the matrix does not know is an error and nothing is applied.
    pub fn calculate_score(&mut self, hits: &[SearchHit], mode: ScoringMode) -> Result<()> {
        let Some(top) = hits.first() else {
            log::debug!("no hits to score");
            return Ok(());
        };

        match mode {
            ScoringMode::WinnerTakeAll => {
                let winner = self.position(&top.machine)?;
                let total = self.position(TOTAL_KEY)?;
                self.entries[winner].1 += 1.0;
                self.entries[total].1 += 1.0;
                log::debug!("{} wins (score {})", top.machine, top.score);
            }
            ScoringMode::Cumulative => {
                let positions = hits
                    .iter()
                    .map(|hit| self.position(&hit.machine))
                    .collect::<Result<Vec<_>>>()?;
                for (position, hit) in positions.into_iter().zip(hits) {
                    self.entries[position].1 += hit.score;
                }
            }
        }
        Ok(())
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UnknownEnvironment(name.to_string()))
    }
}
