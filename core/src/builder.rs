use crate::error::BuildError;
use crate::index::{DocId, DocumentStats, IndexSegment, Posting, PostingsList, TermId};
use crate::tokenizer::Analyzer;
use crate::{Document, RawDocument};
use std::collections::{BTreeMap, HashMap};

/// Accumulates postings and document lengths for a single build pass.
pub struct IndexBuilder {
    analyzer: Analyzer,
    next_term_id: TermId,
    dictionary: BTreeMap<String, TermId>,
    postings: Vec<PostingsList>,
    docs: Vec<DocumentStats>,
    doc_ids: HashMap<String, DocId>,
    total_length: u64,
    ingested: usize,
}

impl IndexBuilder {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            next_term_id: 0,
            dictionary: BTreeMap::new(),
            postings: Vec::new(),
            docs: Vec::new(),
            doc_ids: HashMap::new(),
            total_length: 0,
            ingested: 0,
        }
    }

    /// Validate and ingest one document. The position reported on error is
    /// the zero-based index of the document in the input sequence.
    pub fn add(&mut self, doc: impl Into<RawDocument>) -> Result<(), BuildError> {
        let position = self.ingested;
        let raw: RawDocument = doc.into();
        let doc = raw.validate(position)?;
        self.ingested += 1;
        self.ingest(doc);
        Ok(())
    }

    fn ingest(&mut self, doc: Document) {
        let (doc_id, repeated) = match self.doc_ids.get(&doc.id) {
            Some(&existing) => (existing, true),
            None => {
                let id = self.docs.len() as DocId;
                self.doc_ids.insert(doc.id.clone(), id);
                self.docs.push(DocumentStats { id: doc.id, length: 0 });
                (id, false)
            }
        };

        // Tokenize and compute term frequencies
        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        let mut length = 0u32;
        for term in self.analyzer.analyze(&doc.text) {
            length += 1;
            let tid = match self.dictionary.get(&term) {
                Some(&tid) => tid,
                None => {
                    let tid = self.next_term_id;
                    self.next_term_id += 1;
                    self.dictionary.insert(term, tid);
                    self.postings.push(Vec::new());
                    tid
                }
            };
            *tf_counts.entry(tid).or_insert(0) += 1;
        }

        for (tid, tf) in tf_counts {
            let plist = &mut self.postings[tid as usize];
            // A repeated id folds into its earlier posting, wherever that sits.
            let existing = if repeated {
                plist.iter_mut().rev().find(|p| p.doc_id == doc_id)
            } else {
                None
            };
            match existing {
                Some(p) => p.term_frequency += tf,
                None => plist.push(Posting { doc_id, term_frequency: tf }),
            }
        }

        self.docs[doc_id as usize].length += length;
        self.total_length += length as u64;
    }

    pub fn finish(self) -> IndexSegment {
        let segment = IndexSegment {
            analyzer: self.analyzer,
            dictionary: self.dictionary,
            postings: self.postings,
            docs: self.docs,
            doc_ids: self.doc_ids,
            total_length: self.total_length,
        };
        tracing::info!(
            documents = segment.document_count(),
            terms = segment.term_count(),
            avg_len = segment.average_document_length(),
            "ingested documents"
        );
        segment
    }
}

/// Build a segment from `documents`, failing on the first malformed one.
pub fn build<I>(analyzer: Analyzer, documents: I) -> Result<IndexSegment, BuildError>
where
    I: IntoIterator,
    I::Item: Into<RawDocument>,
{
    let mut builder = IndexBuilder::new(analyzer);
    for doc in documents {
        builder.add(doc)?;
    }
    Ok(builder.finish())
}
