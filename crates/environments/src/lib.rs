//! # Envrec Environments
//!
//! Candidate emulation environments: fixed reference environments and randomly sampled ones,
//! each resolved to the file formats it can read, plus the bulk-load documents that describe
//! them to the search service.
//!
//! ```text
//! EnvironmentDefinition { name, applications }
//!     │
//!     ├──> EnvironmentBuilder (FormatCatalog lookup, uniques-only policy)
//!     │      └─> Environment { id, name, formats }
//!     │
//!     ├──> RandomEnvironmentSampler (observed formats | catalog applications)
//!     │
//!     └──> bulk::encode → NDJSON (action line + document line)
//! ```

pub mod bulk;
mod definition;
mod error;
mod sampling;
mod snapshot;

pub use definition::{
    load_definitions, member_applications, reference_definitions, Environment,
    EnvironmentBuilder, EnvironmentDefinition, EnvironmentKind, RANDOM_MARKER, REFERENCE_MARKER,
};
pub use error::{EnvironmentError, Result};
pub use sampling::{RandomEnvironmentSampler, RandomSource, SamplingConfig};
pub use snapshot::EnvironmentSnapshot;
