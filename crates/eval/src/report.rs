use crate::error::Result;
use crate::matrix::{PerformanceMatrix, TOTAL_KEY};
use envrec_environments::EnvironmentKind;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

/// Largest magnitude below which every integer is exactly representable as `f64`.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Environments ranked by score, highest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(rename = "Summary", serialize_with = "serialize_ranking")]
    pub ranking: Vec<(String, f64)>,
}

/// Whole scores are written as integers (`["Total", 2]`), fractional ones as floats.
fn serialize_ranking<S: Serializer>(
    ranking: &[(String, f64)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(ranking.len()))?;
    for (name, score) in ranking {
        if score.fract() == 0.0 && score.abs() < EXACT_INTEGER_LIMIT {
            seq.serialize_element(&(name, *score as i64))?;
        } else {
            seq.serialize_element(&(name, score))?;
        }
    }
    seq.end()
}

impl Summary {
    /// Stable sort: equal scores keep the matrix order.
    pub fn from_matrix(matrix: &PerformanceMatrix) -> Self {
        let mut ranking = matrix.entries().to_vec();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self { ranking }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), serde_json::to_string(self)?)?;
        log::info!("Summary written to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(serde_json::from_slice(&std::fs::read(path)?)?)
    }

    /// Subtotals per environment category. Names outside every category are logged as
    /// configuration errors and listed in `unclassified`.
    pub fn category_totals(&self) -> CategoryTotals {
        let mut totals = CategoryTotals::default();
        for (name, score) in &self.ranking {
            if name == TOTAL_KEY {
                totals.total += score;
                continue;
            }
            match EnvironmentKind::classify(name) {
                Some(EnvironmentKind::Reference) => totals.reference += score,
                Some(EnvironmentKind::Random) => totals.random += score,
                None => {
                    log::error!("Environment {name} belongs to no category");
                    totals.unclassified.push(name.clone());
                }
            }
        }
        totals
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTotals {
    pub reference: f64,
    pub random: f64,
    pub total: f64,
    pub unclassified: Vec<String>,
}

impl CategoryTotals {
    pub fn log(&self) {
        log::info!("ref: {}", self.reference);
        log::info!("rand: {}", self.random);
        log::info!("{TOTAL_KEY}: {}", self.total);
    }
}
