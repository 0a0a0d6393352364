//! FILENAME: pivot-engine/src/error.rs

use std::fmt;

use thiserror::Error;

/// Boxed error returned by a fallible selector.
pub type SelectorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for fallible selectors.
pub type SelectorResult<V> = Result<V, SelectorError>;

/// Which of the caller-supplied functions failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorKind {
    Column,
    /// Row-key accessor for the named field.
    Row(String),
    Data,
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorKind::Column => f.write_str("column selector"),
            SelectorKind::Row(field) => write!(f, "row selector (field '{}')", field),
            SelectorKind::Data => f.write_str("data selector"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PivotError {
    #[error("Unsupported row key shape: {0}")]
    UnsupportedRowKeyShape(String),

    #[error("Selector evaluation failed in {selector}: {source}")]
    SelectorEvaluation {
        selector: SelectorKind,
        #[source]
        source: SelectorError,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumnName(String),

    #[error("Invalid pivot options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

impl PivotError {
    pub(crate) fn selector(selector: SelectorKind, source: SelectorError) -> Self {
        PivotError::SelectorEvaluation { selector, source }
    }
}
