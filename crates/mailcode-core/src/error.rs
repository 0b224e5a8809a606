//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur while building an extractor.
///
/// Extraction itself never fails: a message without a confident code
/// yields `None`, not an error.
#[derive(Debug, Error)]
pub enum Error {
    /// A pattern in the tables is not a valid regular expression.
    #[error("Invalid pattern `{name}`: {source}")]
    InvalidPattern {
        /// Name of the offending pattern.
        name: String,
        /// Underlying regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// A table that must contain at least one entry is empty.
    #[error("Pattern table is empty: {0}")]
    EmptyTable(&'static str),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
