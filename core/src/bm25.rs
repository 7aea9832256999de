//! Okapi BM25 ranking over an [`InvertedIndex`].
//!
//! Per matching term a document scores
//! `idf * tf * (k1 + 1) / (tf + k1 * (1 - b + b * dl / avgdl))` with
//! `idf = ln(1 + (N - df + 0.5) / (df + 0.5))`. Results are ordered by score
//! descending, ties by ascending document id.

use crate::corpus::{Corpus, Document};
use crate::error::{Result, RetrievalError};
use crate::index::InvertedIndex;
use crate::tokenizer::Tokenizer;
use crate::DocId;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bm25Params {
    /// term-frequency saturation
    pub k1: f64,
    /// document-length normalization
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self { Self { k1: 1.5, b: 0.75 } }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Result<Self> {
        if !k1.is_finite() || k1 < 0.0 {
            return Err(RetrievalError::InvalidConfig(format!("k1 must be a finite value >= 0, got {k1}")));
        }
        if !b.is_finite() || !(0.0..=1.0).contains(&b) {
            return Err(RetrievalError::InvalidConfig(format!("b must be within [0, 1], got {b}")));
        }
        Ok(Self { k1, b })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f64,
}

/// Ranked hits plus the number of candidates before truncation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    pub hits: Vec<ScoredDocument>,
    pub total_hits: usize,
}

/// Corpus, index and ranking settings, built once and only read afterwards.
#[derive(Debug)]
pub struct Retriever {
    corpus: Corpus,
    index: InvertedIndex,
    tokenizer: Tokenizer,
    params: Bm25Params,
}

impl Retriever {
    pub fn new(corpus: Corpus, tokenizer: Tokenizer, params: Bm25Params) -> Self {
        let start = std::time::Instant::now();
        let index = InvertedIndex::build(&corpus, &tokenizer);
        tracing::info!(
            num_docs = index.num_docs(),
            num_terms = index.num_terms(),
            avg_doc_len = index.avg_doc_length(),
            took_ms = start.elapsed().as_millis() as u64,
            "index ready"
        );
        Self { corpus, index, tokenizer, params }
    }

    /// Default tokenizer and BM25 constants.
    pub fn from_corpus(corpus: Corpus) -> Self {
        Self::new(corpus, Tokenizer::default(), Bm25Params::default())
    }

    pub fn corpus(&self) -> &Corpus { &self.corpus }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn params(&self) -> Bm25Params { self.params }

    pub fn document(&self, id: DocId) -> Option<&Document> { self.corpus.get(id) }

    /// Score every document sharing a term with `query` and keep the best `k`.
    pub fn search(&self, query: &str, k: usize) -> Result<SearchOutcome> {
        let q_terms = self.tokenizer.terms(query);
        if q_terms.is_empty() || self.index.num_docs() == 0 {
            return Ok(SearchOutcome::default());
        }

        let n = self.index.num_docs() as f64;
        let avgdl = self.index.avg_doc_length();
        let Bm25Params { k1, b } = self.params;

        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for term in &q_terms {
            let Some(tid) = self.index.term_id(term) else { continue };
            let df = self.index.doc_freq(tid) as f64;
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
            for p in self.index.postings(tid) {
                let tf = p.tf as f64;
                let dl = self.index.doc_length(p.doc_id) as f64;
                // avgdl > 0 whenever a posting exists
                let norm = 1.0 - b + b * dl / avgdl;
                *scores.entry(p.doc_id).or_insert(0.0) += idf * (tf * (k1 + 1.0)) / (tf + k1 * norm);
            }
        }

        let mut scored: Vec<ScoredDocument> = Vec::with_capacity(scores.len());
        for (doc_id, score) in scores {
            if !score.is_finite() {
                return Err(RetrievalError::InternalScoring(format!("non-finite score {score} for document {doc_id}")));
            }
            scored.push(ScoredDocument { doc_id, score });
        }
        scored.sort_by(rank_order);
        let total_hits = scored.len();
        scored.truncate(k);
        Ok(SearchOutcome { hits: scored, total_hits })
    }

    /// Contents of the `top_k` best passages for `query`, best first.
    pub fn retrieve(&self, query: &str, top_k: i64) -> Result<Vec<String>> {
        if top_k < 0 {
            return Err(RetrievalError::InvalidRequest(format!("top_k must be >= 0, got {top_k}")));
        }
        let k = usize::try_from(top_k).unwrap_or(usize::MAX);
        let outcome = self.search(query, k)?;
        outcome
            .hits
            .iter()
            .map(|hit| {
                self.corpus
                    .get(hit.doc_id)
                    .map(|d| d.content.clone())
                    .ok_or_else(|| RetrievalError::InternalScoring(format!("ranked unknown document {}", hit.doc_id)))
            })
            .collect()
    }
}

fn rank_order(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.doc_id.cmp(&b.doc_id))
}
