//! Error types for DDL generation.

use thiserror::Error;

/// Errors that can occur while turning a change tree into DDL.
///
/// Only contract violations are reported here. Capability gaps and
/// unresolvable references are handled by falling back or skipping.
#[derive(Debug, Error)]
pub enum DdlError {
    /// A change node accessor was used on the wrong variant.
    #[error("unexpected change node: expected {expected}, found {found}")]
    UnexpectedChange {
        /// The variant the caller asked for.
        expected: &'static str,
        /// The variant that was actually present.
        found: &'static str,
    },

    /// A value carried by a change node was not the expected object kind.
    #[error("unexpected value in change tree: expected {expected}, found {found}")]
    UnexpectedValue {
        /// The object kind the walker needed.
        expected: &'static str,
        /// The object kind that was present.
        found: &'static str,
    },

    /// A fragment store entry held the wrong number of statements.
    #[error("fragment for {key} is not a {expected}")]
    FragmentShape {
        /// Identity key of the entry.
        key: String,
        /// Expected shape ("single statement" or "statement list").
        expected: &'static str,
    },

    /// An object was processed without the context it needs.
    #[error("missing context: {0}")]
    MissingContext(String),

    /// IO error while reading inputs or writing scripts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error decoding catalogs, change trees or options.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for DDL generation.
pub type Result<T> = std::result::Result<T, DdlError>;
