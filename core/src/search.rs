use crate::error::SearchError;
use crate::index::{DocId, IndexSegment};
use crate::query::{Query, TEXT_FIELD};
use crate::scoring::{CorpusStats, ScoringMode};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub id: String,
    pub score: f64,
}

/// Score descending, then id ascending. Total, so rankings never depend on
/// hash or insertion order.
fn rank_order(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

/// Rank the documents of `segment` that match any term of `query`.
pub fn search(
    segment: &IndexSegment,
    query: &Query,
    mode: ScoringMode,
    top_k: usize,
) -> Result<Vec<ScoredDocument>, SearchError> {
    if top_k == 0 {
        return Err(SearchError::InvalidArgument("top_k must be at least 1".into()));
    }
    let similarity = mode.similarity();
    let corpus = CorpusStats {
        document_count: segment.document_count(),
        average_document_length: segment.average_document_length(),
    };

    // Aggregate scores from postings, term by term in query order
    let mut scores: HashMap<DocId, f64> = HashMap::new();
    for qt in query.terms.iter().filter(|t| t.targets(TEXT_FIELD)) {
        let postings = segment.postings_for(&qt.term);
        let df = postings.len() as u32;
        for p in postings {
            let length = segment.document_stats(p.doc_id).length;
            let score = similarity.score(&corpus, df, p.term_frequency, length);
            *scores.entry(p.doc_id).or_insert(0.0) += score;
        }
    }

    let mut ranked: Vec<ScoredDocument> = scores
        .into_iter()
        .filter(|(_, score)| *score != 0.0)
        .map(|(doc, score)| ScoredDocument { id: segment.document_id(doc).to_string(), score })
        .collect();
    let total_hits = ranked.len();

    // partial select for top-k, then order the survivors
    if ranked.len() > top_k {
        ranked.select_nth_unstable_by(top_k - 1, rank_order);
        ranked.truncate(top_k);
    }
    ranked.sort_unstable_by(rank_order);

    tracing::debug!(
        mode = %mode,
        terms = query.len(),
        total_hits,
        returned = ranked.len(),
        "search complete"
    );
    Ok(ranked)
}
