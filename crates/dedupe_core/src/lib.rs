//! # dedupe_core
//!
//! A CRM account deduplication engine: ingest a batch of account records,
//! normalize names, generate and score candidate duplicate pairs, group
//! them with an edge-gated union-find, choose a survivor per group, overlay
//! alias cross-links, and classify every record with a final disposition.
//!
//! ## Modules
//!
//! - [`ids`] - Salesforce-style 15/18-character identifier canonicalization
//! - [`normalize`] - Name normalization and alias extraction
//! - [`ingest`] - CSV ingestion boundary
//! - [`block`] - Soft-ban candidate pair generation
//! - [`score`] - Fuzzy name similarity scoring
//! - [`group`] - Edge-gated union-find grouping
//! - [`survivor`] - Primary selection and merge preview
//! - [`alias`] - Alias cross-link overlay
//! - [`disposition`] - Keep/Update/Delete/Verify classification
//! - [`diagnostics`] - Run statistics
//! - [`overrides`] - Read-only manual override/blacklist providers
//! - [`config`] - Run configuration
//! - [`errors`] - Unified error handling
//! - [`pipeline`] - The top-level `run` orchestrator
//!
//! ## Quick start
//!
//! ```
//! use dedupe_core::config::Config;
//! use dedupe_core::pipeline::{self, CancellationToken};
//!
//! # fn main() -> dedupe_core::Result<()> {
//! let records = dedupe_core::ingest::ingest(
//!     "Account ID,Account Name,Created Date,Relationship\n\
//!      001A000000BcDeF,Acme Inc,2020-01-01T00:00:00Z,Customer\n",
//! )?;
//! let config = Config::default();
//! let artifacts = pipeline::run(&records, &config, None, None, &CancellationToken::new())?;
//! assert_eq!(artifacts.groups.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod alias;
pub mod block;
pub mod config;
pub mod diagnostics;
pub mod disposition;
pub mod errors;
pub mod group;
pub mod ids;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod overrides;
pub mod pipeline;
pub mod score;
pub mod survivor;

pub use config::Config;
pub use errors::{Error, Result};
pub use pipeline::{run, RunArtifacts};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
