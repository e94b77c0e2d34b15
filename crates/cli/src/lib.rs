//! Library side of the `envrec` binary: configuration, logging and the pipeline stages.
//!
//! ```text
//! scrape ──► app2fformats.json
//!                  │
//! build  ──► reference_envs.json, random_envs.json, envs_for_knn.json,
//!            knn_envs.json, knn_envs_setup.json, vocabulary.json, uniqueid_counts.json
//!                  │
//! load   ──► search service (keyword + vector collections)
//!                  │
//! evaluate ─► summary_<strategy>.json
//! ```

pub mod config;
pub mod logging;
pub mod pipeline;

pub use config::{EvaluationConfig, PathsConfig, Settings, DEFAULT_CONFIG_FILE};
pub use logging::{LogOptions, LogSession, DEFAULT_LOG_DIR};
