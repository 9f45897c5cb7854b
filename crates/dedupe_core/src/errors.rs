//! Error types for the account deduplication engine.
//!
//! This module defines the closed set of error kinds that can cross the
//! [`crate::run`] boundary. Nothing in the matching engine panics on
//! malformed *input* data; every recoverable condition either becomes one of
//! these variants or is absorbed and logged (see the module-level docs on
//! [`crate::ingest`] and [`crate::overrides`]).
use thiserror::Error as ThisError;

/// Result type alias using this crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while deduplicating a batch of account records.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A 15- or 18-character account identifier failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Two or more input rows canonicalized to the same `account_id`.
    #[error("duplicate canonical identifiers found: {samples:?} (and {more_count} more)")]
    DuplicateIdentifier {
        /// First three duplicate values, for triage.
        samples: Vec<String>,
        /// Count of additional duplicates beyond `samples`.
        more_count: usize,
    },

    /// One or more required input columns were absent.
    #[error("missing required column(s): {0:?}")]
    MissingColumn(Vec<String>),

    /// A `created_date` value could not be parsed as ISO-8601 or a
    /// spreadsheet serial. This variant is only used internally for
    /// diagnostics; malformed dates do not fail ingestion (§7: the record
    /// is retained with `created_date = None`).
    #[error("malformed date for account {account_id}: {raw}")]
    MalformedDate {
        /// The canonical id of the offending record.
        account_id: String,
        /// The raw value that failed to parse.
        raw: String,
    },

    /// The supplied configuration failed validation.
    #[error("malformed configuration: {0}")]
    MalformedConfig(String),

    /// The blocker produced more candidate pairs than `pipeline.max_pairs`
    /// allows.
    #[error("candidate pair cap exceeded: generated {generated}, limit {limit}; tune allowlist/denylist blocking config")]
    PairCapExceeded {
        /// Pairs generated before the guard tripped.
        generated: usize,
        /// The configured `pipeline.max_pairs` limit.
        limit: usize,
    },

    /// The run was cancelled via the caller-supplied cancellation token.
    #[error("run cancelled")]
    Cancelled,
}
