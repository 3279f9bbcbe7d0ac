//! Lexical features: corpus vocabulary and per-document token frequencies.
//!
//! Extraction runs in two passes. `ingest` tokenizes every document and
//! interns each token into the corpus pool, fixing the vocabulary. `profile`
//! then re-tokenizes one document at a time and counts canonical handles
//! in a [`FrequencyMap`] that borrows its keys from the pool, so documents
//! are compared over identical handles without copying any token text.

use crate::frequency_map::{FrequencyMap, Iter as CountIter};
use crate::string_pool::{Iter as VocabularyIter, StringPool};
use crate::tokenizer::Scanner;

/// What `ingest` saw in one document.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DocumentSummary {
    pub tokens: usize,
    pub comments: usize,
}

pub struct LexicalExtractor {
    pool: StringPool,
    documents: usize,
}

impl Default for LexicalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalExtractor {
    pub fn new() -> Self {
        Self::with_pool(StringPool::new())
    }

    /// Start from an existing pool, e.g. one built with a custom config.
    pub fn with_pool(pool: StringPool) -> Self {
        Self { pool, documents: 0 }
    }

    /// First pass: add every token of `source` to the vocabulary.
    pub fn ingest(&mut self, source: &[u8]) -> DocumentSummary {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.intern_all(&mut self.pool);
        self.documents += 1;
        let summary = DocumentSummary {
            tokens,
            comments: scanner.comments(),
        };
        log::trace!(
            "document {}: {} tokens, {} comments, vocabulary now {}",
            self.documents,
            summary.tokens,
            summary.comments,
            self.pool.len()
        );
        summary
    }

    /// Second pass: count the canonical tokens of `source`.
    ///
    /// Tokens missing from the vocabulary (documents that were never
    /// ingested) are not counted per handle; they only show up in
    /// `out_of_vocabulary`.
    pub fn profile<'p>(&'p self, source: &[u8]) -> DocumentProfile<'p> {
        let mut scanner = Scanner::new(source);
        let mut counts = FrequencyMap::new();
        let mut tokens = 0;
        let mut out_of_vocabulary = 0;
        while let Some(token) = scanner.next_token() {
            tokens += 1;
            match self.pool.get(token.text(source)) {
                Some(handle) => {
                    let prev = counts.get(handle);
                    counts.put(handle, prev.saturating_add(1));
                }
                None => out_of_vocabulary += 1,
            }
        }
        DocumentProfile {
            counts,
            tokens,
            comments: scanner.comments(),
            out_of_vocabulary,
        }
    }

    /// Every canonical token seen by `ingest`, in a stable order as long as
    /// no further documents are ingested.
    pub fn vocabulary(&self) -> VocabularyIter<'_> {
        self.pool.iter()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.pool.len()
    }

    /// Documents passed to `ingest` so far.
    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn pool(&self) -> &StringPool {
        &self.pool
    }

    /// One relative frequency per vocabulary entry, in `vocabulary()` order:
    /// the document's row of the document x vocabulary table.
    pub fn term_frequencies(&self, profile: &DocumentProfile<'_>) -> Vec<f64> {
        let total = profile.tokens;
        self.vocabulary()
            .map(|handle| {
                if total == 0 {
                    0.0
                } else {
                    f64::from(profile.count(handle)) / total as f64
                }
            })
            .collect()
    }
}

/// Token counts for one document, keyed by pool handles.
pub struct DocumentProfile<'p> {
    counts: FrequencyMap<'p>,
    tokens: usize,
    comments: usize,
    out_of_vocabulary: usize,
}

impl<'p> DocumentProfile<'p> {
    pub fn count(&self, token: &[u8]) -> u32 {
        self.counts.get(token)
    }

    /// Tokens scanned, including out-of-vocabulary ones.
    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn comments(&self) -> usize {
        self.comments
    }

    pub fn out_of_vocabulary(&self) -> usize {
        self.out_of_vocabulary
    }

    /// Distinct canonical tokens in the document.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> CountIter<'_, 'p> {
        self.counts.iter()
    }
}
