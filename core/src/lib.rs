//! Passage retrieval over a single book-length text.
//!
//! The text is split into paragraph documents by [`corpus`], indexed once by
//! [`index::InvertedIndex`] and ranked with Okapi BM25 by [`bm25`]. Everything
//! built here is immutable after construction and can be shared across
//! threads behind an `Arc`.

pub mod bm25;
pub mod corpus;
pub mod error;
pub mod index;
pub mod tokenizer;

pub use bm25::{Bm25Params, Retriever, ScoredDocument, SearchOutcome};
pub use corpus::{Corpus, Document};
pub use error::{Result, RetrievalError};
pub use index::{InvertedIndex, Posting};
pub use tokenizer::{Tokenizer, TokenizerConfig};

pub type TermId = u32;
pub type DocId = u32;

/// Result count used when a caller does not ask for one.
pub const DEFAULT_TOP_K: usize = 5;
