use anyhow::{Context, Result};
use clap::Parser;
use retriever::{Bm25Params, Corpus, Retriever, Tokenizer, TokenizerConfig, DEFAULT_TOP_K};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "server")]
#[command(about = "Serve the most relevant passages of a book over HTTP (BM25)")]
pub struct Args {
    /// UTF-8 text file, paragraphs separated by blank lines
    #[arg(long, env = "CORPUS_PATH", default_value = "./book.txt")]
    pub corpus: PathBuf,
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
    /// Number of passages returned when a request does not say
    #[arg(long, env = "DEFAULT_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub default_top_k: usize,
    /// BM25 term-frequency saturation
    #[arg(long, env = "BM25_K1", default_value_t = 1.5)]
    pub bm25_k1: f64,
    /// BM25 length normalization, within [0, 1]
    #[arg(long, env = "BM25_B", default_value_t = 0.75)]
    pub bm25_b: f64,
    /// Index surface forms instead of English stems
    #[arg(long, env = "NO_STEM")]
    pub no_stem: bool,
    /// Keep English stopwords in the index and in queries
    #[arg(long, env = "KEEP_STOPWORDS")]
    pub keep_stopwords: bool,
}

impl Args {
    pub fn tokenizer_config(&self) -> TokenizerConfig {
        TokenizerConfig { stem: !self.no_stem, remove_stopwords: !self.keep_stopwords }
    }

    /// Read the corpus and build the index. Any failure here means the
    /// service must not start.
    pub fn load_retriever(&self) -> Result<Retriever> {
        let params = Bm25Params::new(self.bm25_k1, self.bm25_b).context("invalid BM25 parameters")?;
        let corpus = Corpus::load(&self.corpus).context("failed to load corpus")?;
        if corpus.is_empty() {
            tracing::warn!(path = %self.corpus.display(), "corpus has no passages, every query will return nothing");
        }
        Ok(Retriever::new(corpus, Tokenizer::new(self.tokenizer_config()), params))
    }
}
