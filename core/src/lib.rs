//! Inverted-index document retrieval with BM25 and TF-IDF ranking.

pub mod builder;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod query;
pub mod scoring;
pub mod search;
pub mod store;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

pub use builder::{build, IndexBuilder};
pub use engine::{BuildSummary, EngineConfig, SearchEngine};
pub use error::{BuildError, QuerySyntaxError, SearchError};
pub use index::{DocId, DocumentStats, IndexSegment, Posting, PostingsList, TermId};
pub use query::{Query, QueryParser, QueryTerm, TEXT_FIELD};
pub use scoring::{Bm25, ScoringMode, Similarity, TfIdf};
pub use search::ScoredDocument;
pub use store::IndexStore;
pub use tokenizer::Analyzer;

/// A validated input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// A document as it arrives on the wire; either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl RawDocument {
    /// Check required fields; `position` is only used for the error report.
    pub fn validate(self, position: usize) -> Result<Document, BuildError> {
        let id = match self.id {
            Some(id) if !id.is_empty() => id,
            Some(_) => return Err(BuildError::malformed(position, "empty id")),
            None => return Err(BuildError::malformed(position, "missing id")),
        };
        let text = self.text.ok_or_else(|| BuildError::malformed(position, "missing text"))?;
        Ok(Document { id, text })
    }
}

impl From<Document> for RawDocument {
    fn from(doc: Document) -> Self {
        RawDocument { id: Some(doc.id), text: Some(doc.text) }
    }
}
