//! Error types for SDF parsing, querying, schema building and validation.

use thiserror::Error;

/// Errors that can occur while working with SDF documents.
///
/// The first four variants are programmer errors (malformed input text,
/// malformed selector, malformed schema description, bad edit target) and are
/// reported immediately. `Validation` is a data error: the document is well
/// formed but does not satisfy a schema.
#[derive(Error, Debug)]
pub enum SdfError {
    /// The input text was not valid SDF.
    #[error("Syntax error: {0}")]
    Parse(String),

    /// A selector path could not be parsed.
    #[error("Invalid selector: {0}")]
    Selector(String),

    /// A schema description document was malformed or internally inconsistent.
    #[error("Invalid schema: {0}")]
    Schema(String),

    /// A tree edit targeted an element it cannot apply to.
    #[error("Edit error: {0}")]
    Edit(String),

    /// A document failed schema validation during streaming ingestion.
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// Convenience alias used throughout sdf-core.
pub type Result<T> = std::result::Result<T, SdfError>;

/// Why a document does not match a schema.
///
/// Returned by [`crate::Schema::validate`] and
/// [`crate::Schema::validate_partial`] instead of being stored on the schema,
/// so a single `Schema` can be shared across threads. For `one-of`
/// alternatives the message aggregates every branch, one tab-indented line
/// per branch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        ValidationError {
            message: message.into(),
        }
    }

    /// Human-readable reason for the first failure found.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The message shifted one tab deeper, for nesting under a combinator.
    pub(crate) fn indented(&self) -> String {
        format!("\t{}", self.message.replace('\n', "\n\t"))
    }
}
