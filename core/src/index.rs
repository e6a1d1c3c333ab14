use crate::tokenizer::Analyzer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_frequency: u32,
}

/// Postings for one term, in document arrival order, one entry per document.
pub type PostingsList = Vec<Posting>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// External document id.
    pub id: String,
    /// Number of analyzed tokens, repeats included.
    pub length: u32,
}

/// One complete, immutable index over a corpus snapshot.
///
/// Documents are numbered by arrival order (`DocId`), terms by `TermId`.
/// Segments are only produced by [`crate::builder`] or read back by
/// [`crate::persist`]; nothing mutates one after that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSegment {
    pub(crate) analyzer: Analyzer,
    pub(crate) dictionary: BTreeMap<String, TermId>,
    pub(crate) postings: Vec<PostingsList>, // indexed by TermId
    pub(crate) docs: Vec<DocumentStats>,    // indexed by DocId
    pub(crate) doc_ids: HashMap<String, DocId>,
    pub(crate) total_length: u64,
}

impl IndexSegment {
    pub fn empty(analyzer: Analyzer) -> Self {
        Self { analyzer, ..Self::default() }
    }

    pub fn analyzer(&self) -> &Analyzer { &self.analyzer }

    /// Postings for `term`; empty when the term never occurs.
    pub fn postings_for(&self, term: &str) -> &[Posting] {
        self.dictionary
            .get(term)
            .and_then(|&tid| self.postings.get(tid as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.postings_for(term).len() as u32
    }

    pub fn length_of(&self, document_id: &str) -> Option<u32> {
        self.doc_ids.get(document_id).map(|&d| self.docs[d as usize].length)
    }

    pub fn document_count(&self) -> u32 { self.docs.len() as u32 }

    pub fn average_document_length(&self) -> f64 {
        if self.docs.is_empty() {
            return 0.0;
        }
        self.total_length as f64 / self.docs.len() as f64
    }

    /// External id of an internal document number.
    pub fn document_id(&self, doc: DocId) -> &str { &self.docs[doc as usize].id }

    pub fn document_stats(&self, doc: DocId) -> &DocumentStats { &self.docs[doc as usize] }

    pub fn term_count(&self) -> usize { self.dictionary.len() }

    /// Terms in lexicographic order.
    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.dictionary.keys().map(String::as_str)
    }

    /// Consolidate into a single canonical physical layout.
    ///
    /// Term ids are reassigned in lexicographic term order and buffers are
    /// compacted. Postings, document stats and aggregates are unchanged, and
    /// merging an already merged segment returns an equal segment.
    pub fn merge(self) -> IndexSegment {
        let IndexSegment {
            analyzer,
            dictionary,
            mut postings,
            mut docs,
            doc_ids,
            total_length,
        } = self;

        let mut new_dictionary = BTreeMap::new();
        let mut new_postings = Vec::with_capacity(dictionary.len());
        for (new_id, (term, old_id)) in dictionary.into_iter().enumerate() {
            let mut list = std::mem::take(&mut postings[old_id as usize]);
            list.shrink_to_fit();
            new_postings.push(list);
            new_dictionary.insert(term, new_id as TermId);
        }
        docs.shrink_to_fit();

        IndexSegment {
            analyzer,
            dictionary: new_dictionary,
            postings: new_postings,
            docs,
            doc_ids,
            total_length,
        }
    }

    /// Rebuild the derived lookup tables after the raw parts were loaded.
    pub(crate) fn from_parts(
        analyzer: Analyzer,
        dictionary: BTreeMap<String, TermId>,
        postings: Vec<PostingsList>,
        docs: Vec<DocumentStats>,
    ) -> Self {
        let doc_ids = docs
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i as DocId))
            .collect();
        let total_length = docs.iter().map(|d| d.length as u64).sum();
        Self { analyzer, dictionary, postings, docs, doc_ids, total_length }
    }
}
