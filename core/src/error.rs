use std::path::PathBuf;

/// Failures surfaced by corpus loading and ranking.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The corpus file could not be read or is not valid UTF-8.
    #[error("corpus unavailable at {}: {source}", path.display())]
    CorpusUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A query parameter was rejected, e.g. a negative result count.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Scoring produced something it never should (non-finite score).
    #[error("internal scoring error: {0}")]
    InternalScoring(String),

    /// Ranking or tokenizer settings are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
