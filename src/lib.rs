//! cellar-lexicon: byte-string interning and counting over a coalesced
//! hash table with a cellar, plus the C-like tokenizer that feeds them.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: deduplicate the tokens of a source corpus into canonical
//!   handles and count them per document, with one table algorithm shared
//!   by both uses.
//! - Layers:
//!   - CellarTable<K, V>: coalesced hashing over a fixed slot array. The
//!     last slots form the cellar, which absorbs collisions before the
//!     primary region is probed. Grows by doubling and re-inserting.
//!   - StringPool: `CellarTable<Box<[u8]>, ()>`. Owns one copy of each
//!     distinct byte string and hands out `&[u8]` over it.
//!   - FrequencyMap<'k>: `CellarTable<&'k [u8], u32>`. Borrows its keys,
//!     typically pool handles, and never copies them.
//!   - Scanner: finite-state tokenizer over a byte buffer, pulled one
//!     token at a time.
//!   - LexicalExtractor / LayoutFeatures: the feature passes built on top.
//!
//! Constraints
//! - Single-threaded; tables are plain owned values.
//! - Keys are compared by content and length, so embedded zeros are
//!   significant in the table. The pool and the tokenizer both stop at
//!   the first zero byte of their input.
//! - Each entry stores its 32-bit djb2 hash; growth re-inserts from the
//!   stored hash without touching key bytes.
//! - There is no removal. Tables only grow or are cleared.
//!
//! Key ownership
//! - The table is generic over the stored key through `SlotKey` (how to
//!   read its bytes) and `AdoptKey` (how to turn a probe into a stored
//!   key on a miss). `Box<[u8]>` copies, `&[u8]` borrows. The choice is
//!   made once per table type, not per call.
//!
//! Failure semantics
//! - Invalid construction parameters are reported as `TableError`.
//! - A load factor outside (0, 1) is corrected to the default with a
//!   warning, never rejected.
//! - A corrupted chain is logged at `error` level and then panics; it
//!   cannot be produced through the public API.

pub mod cellar;
mod cellar_proptest;
pub mod config;
pub mod error;
pub mod frequency_map;
pub mod layout;
pub mod lexical;
pub mod string_pool;
pub mod tokenizer;

// Public surface
pub use cellar::{hash_bytes, CellarTable, Placement, TableStats, DEFAULT_LOAD_FACTOR};
pub use config::TableConfig;
pub use error::{IntegrityError, TableError};
pub use frequency_map::FrequencyMap;
pub use layout::LayoutFeatures;
pub use lexical::{DocumentProfile, DocumentSummary, LexicalExtractor};
pub use string_pool::StringPool;
pub use tokenizer::{tokenize, Scanner, Token, TokenKind};
