//! Relevance functions.
//!
//! Both similarities are pure functions of corpus statistics and one
//! (term, document) pair; a document's score is the sum over query terms.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const BM25_K1: f64 = 1.0;
pub const BM25_B: f64 = 0.65;

/// Corpus-wide statistics a similarity may depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorpusStats {
    pub document_count: u32,
    pub average_document_length: f64,
}

pub trait Similarity: Send + Sync {
    /// Contribution of one term to one document's score.
    fn score(
        &self,
        corpus: &CorpusStats,
        document_frequency: u32,
        term_frequency: u32,
        document_length: u32,
    ) -> f64;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25 {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Bm25 { k1: BM25_K1, b: BM25_B }
    }
}

impl Bm25 {
    pub fn idf(&self, document_count: u32, document_frequency: u32) -> f64 {
        let n = document_count as f64;
        let df = document_frequency as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }
}

impl Similarity for Bm25 {
    fn score(
        &self,
        corpus: &CorpusStats,
        document_frequency: u32,
        term_frequency: u32,
        document_length: u32,
    ) -> f64 {
        if document_frequency == 0 || term_frequency == 0 {
            return 0.0;
        }
        let tf = term_frequency as f64;
        let dl = document_length as f64;
        // avgdl > 0 whenever some document holds the term
        let norm = 1.0 - self.b + self.b * (dl / corpus.average_document_length);
        let idf = self.idf(corpus.document_count, document_frequency);
        idf * (tf * (self.k1 + 1.0)) / (tf + self.k1 * norm)
    }

    fn name(&self) -> &'static str { "BM-25" }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TfIdf;

impl Similarity for TfIdf {
    fn score(
        &self,
        corpus: &CorpusStats,
        document_frequency: u32,
        term_frequency: u32,
        _document_length: u32,
    ) -> f64 {
        if document_frequency == 0 {
            return 0.0;
        }
        let idf = (corpus.document_count as f64 / document_frequency as f64).ln();
        term_frequency as f64 * idf
    }

    fn name(&self) -> &'static str { "TF-IDF" }
}

static BM25: Bm25 = Bm25 { k1: BM25_K1, b: BM25_B };
static TF_IDF: TfIdf = TfIdf;

/// Caller-selected ranking model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScoringMode {
    #[default]
    #[serde(rename = "BM-25")]
    Bm25,
    #[serde(rename = "TF-IDF")]
    TfIdf,
}

impl ScoringMode {
    pub fn similarity(self) -> &'static dyn Similarity {
        match self {
            ScoringMode::Bm25 => &BM25,
            ScoringMode::TfIdf => &TF_IDF,
        }
    }

    pub fn as_str(self) -> &'static str { self.similarity().name() }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bm-25" | "bm25" => Ok(ScoringMode::Bm25),
            "tf-idf" | "tfidf" => Ok(ScoringMode::TfIdf),
            other => Err(SearchError::InvalidArgument(format!(
                "unknown scoring mode {other:?}, expected BM-25 or TF-IDF"
            ))),
        }
    }
}
