//! # Envrec Catalog
//!
//! Mapping from application tags to the file formats each application can read and write,
//! scraped from knowledge-graph entity pages.
//!
//! ```text
//! application tags
//!     │
//!     ├──> WikiClient (GET /wiki/<tag>, sequential)
//!     │
//!     ├──> tokenize  → PageToken[]  (Property | Entity | Other)
//!     │
//!     ├──> ScanState transition table → read / write lists
//!     │
//!     └──> FormatCatalog  (app2fformats.json)
//! ```

mod error;
mod fetch;
pub mod scrape;
mod types;

pub use error::{CatalogError, Result};
pub use fetch::{FormatUsers, WikiClient, WikiConfig, DEFAULT_WIKI_URL};
pub use types::{singletons, Application, FormatCatalog, FormatSupport};
