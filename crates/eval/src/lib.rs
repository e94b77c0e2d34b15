//! # Envrec Eval
//!
//! Scores candidate environments against a corpus of identified disk images.
//!
//! ```text
//! data dir (*.json identification reports)
//!        │
//!        ▼
//!   ImageCorpus ──► detected formats per image (UNKNOWN removed)
//!        │
//!        ▼
//!   Evaluator ──► keyword / nearest-neighbour queries (one strategy per run)
//!        │
//!        ▼
//!   PerformanceMatrix ──► Summary + category totals
//! ```
//!
//! Queries are sent one at a time; a run owns its matrix.

mod corpus;
mod error;
mod evaluator;
mod identification;
mod matrix;
mod report;

pub use corpus::ImageCorpus;
pub use error::{EvalError, Result};
pub use evaluator::{Evaluator, QueryStrategy, StrategyRun};
pub use identification::{FormatMatch, IdentificationReport, IdentifiedFile, UNKNOWN_FORMAT};
pub use matrix::{PerformanceMatrix, ScoringMode, TOTAL_KEY};
pub use report::{CategoryTotals, Summary};
