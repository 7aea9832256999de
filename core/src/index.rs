//! In-memory inverted index holding the statistics BM25 needs.

use crate::corpus::Corpus;
use crate::tokenizer::Tokenizer;
use crate::{DocId, TermId};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Term dictionary, postings and length statistics for one corpus.
///
/// Built once by [`InvertedIndex::build`]; there is no update path, so the
/// contents always reflect the corpus passed to that call.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    dictionary: HashMap<String, TermId>,
    /// postings indexed by term id, each sorted by doc_id
    postings: Vec<Vec<Posting>>,
    doc_lengths: Vec<u32>,
    total_length: u64,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    pub fn build(corpus: &Corpus, tokenizer: &Tokenizer) -> Self {
        let mut index = Self::new();
        index.doc_lengths.reserve(corpus.len());
        for doc in corpus {
            let terms = tokenizer.terms(&doc.content);
            let doc_len = terms.len() as u32;

            let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
            for term in terms {
                let next_id = index.postings.len() as TermId;
                let tid = *index.dictionary.entry(term).or_insert(next_id);
                if tid == next_id {
                    index.postings.push(Vec::new());
                }
                *tf_counts.entry(tid).or_insert(0) += 1;
            }
            // documents arrive in id order, so pushing keeps each list sorted
            for (tid, tf) in tf_counts {
                index.postings[tid as usize].push(Posting { doc_id: doc.id, tf });
            }

            debug_assert_eq!(doc.id as usize, index.doc_lengths.len());
            index.doc_lengths.push(doc_len);
            index.total_length += doc_len as u64;
        }
        tracing::debug!(num_docs = index.num_docs(), num_terms = index.num_terms(), "built inverted index");
        index
    }

    pub fn num_docs(&self) -> usize { self.doc_lengths.len() }

    pub fn num_terms(&self) -> usize { self.dictionary.len() }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    pub fn postings(&self, term_id: TermId) -> &[Posting] {
        self.postings.get(term_id as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of documents containing the term.
    pub fn doc_freq(&self, term_id: TermId) -> usize { self.postings(term_id).len() }

    pub fn doc_length(&self, doc_id: DocId) -> u32 {
        self.doc_lengths.get(doc_id as usize).copied().unwrap_or(0)
    }

    /// Average document length in terms; 0 for an empty index.
    pub fn avg_doc_length(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        self.total_length as f64 / self.doc_lengths.len() as f64
    }
}
