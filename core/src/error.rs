use std::io;
use thiserror::Error;

/// Failures of an index build. Any of these aborts the build as a whole; the
/// previously installed segment stays active.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("malformed document at position {position}: {reason}")]
    MalformedDocument { position: usize, reason: String },

    #[error("index storage error: {0}")]
    Io(#[from] io::Error),
}

impl BuildError {
    pub fn malformed(position: usize, reason: impl Into<String>) -> Self {
        BuildError::MalformedDocument { position, reason: reason.into() }
    }

    /// Short, stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::MalformedDocument { .. } => "malformed_document",
            BuildError::Io(_) => "build_io",
        }
    }
}

impl From<bincode::Error> for BuildError {
    fn from(e: bincode::Error) -> Self {
        BuildError::Io(io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl From<serde_json::Error> for BuildError {
    fn from(e: serde_json::Error) -> Self {
        BuildError::Io(io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuerySyntaxError {
    #[error("query is empty")]
    Empty,
    #[error("query {0:?} contains no searchable terms")]
    NoTerms(String),
    #[error("no fields to search")]
    NoFields,
}

/// Per-request search failures. None of them touch the shared index.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    QuerySyntax(#[from] QuerySyntaxError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no index has been built yet")]
    IndexUnavailable,
}

impl SearchError {
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::QuerySyntax(_) => "query_syntax",
            SearchError::InvalidArgument(_) => "invalid_argument",
            SearchError::IndexUnavailable => "index_unavailable",
        }
    }
}
