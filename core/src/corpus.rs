use crate::error::{Result, RetrievalError};
use crate::DocId;
use serde::Serialize;
use std::path::Path;

/// Separator between passages in the source text.
const PASSAGE_SEPARATOR: &str = "\n\n";

/// One paragraph of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: DocId,
    pub content: String,
}

/// The ordered, read-only collection of passages.
#[derive(Debug, Default, Clone)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    /// Split raw text into passages.
    pub fn from_text(text: &str) -> Self {
        Self { docs: split_passages(text) }
    }

    /// Read a UTF-8 file and split it into passages.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RetrievalError::CorpusUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let corpus = Self::from_text(&text);
        tracing::info!(path = %path.display(), bytes = text.len(), passages = corpus.len(), "loaded corpus");
        Ok(corpus)
    }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        // ids are assigned sequentially, so they double as positions
        self.docs.get(id as usize)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> { self.docs.iter() }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter { self.docs.iter() }
}

/// Split text on blank lines into non-empty passages numbered from 0 in source
/// order. Only the text as a whole is trimmed; passages keep their content as
/// split. Windows line endings are folded to `\n` first.
pub fn split_passages(text: &str) -> Vec<Document> {
    let normalized = text.replace("\r\n", "\n");
    normalized
        .trim()
        .split(PASSAGE_SEPARATOR)
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(i, p)| Document { id: i as DocId, content: p.to_string() })
        .collect()
}
