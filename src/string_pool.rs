//! StringPool: owning interner over a cellar table.
//!
//! Each distinct byte string is copied once into a pool-owned buffer. The
//! buffer is the canonical handle for that content: interning equal bytes
//! again, from any source, returns a slice over the same buffer and
//! allocates nothing. Canonical content ends at the first zero byte, so
//! `b"ab\0cd"` and `b"ab"` intern to the same handle.

use crate::cellar::{CellarTable, Iter as SlotIter, TableStats};
use crate::config::TableConfig;
use crate::error::TableError;

pub struct StringPool {
    table: CellarTable<Box<[u8]>, ()>,
    heap_usage: usize,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

/// The prefix of `bytes` that the pool stores: everything before the first
/// zero byte.
#[inline]
fn canonical(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

impl StringPool {
    pub fn new() -> Self {
        Self::with_config(TableConfig::STRING_POOL)
    }

    /// # Panics
    /// If the slot array cannot be built from `config`.
    pub fn with_config(config: TableConfig) -> Self {
        Self {
            table: CellarTable::with_config(config),
            heap_usage: 0,
        }
    }

    pub fn try_with_config(config: TableConfig) -> Result<Self, TableError> {
        Ok(Self {
            table: CellarTable::try_with_config(config)?,
            heap_usage: 0,
        })
    }

    /// Return the canonical handle for `bytes`, copying them on first sight.
    pub fn intern(&mut self, bytes: &[u8]) -> &[u8] {
        let content = canonical(bytes);
        let (key, _, placement) = self.table.find_or_create(content, || ());
        if placement.created() {
            self.heap_usage += key.len();
        }
        key
    }

    /// The canonical handle for `bytes` if it was interned before.
    pub fn get(&self, bytes: &[u8]) -> Option<&[u8]> {
        self.table.find(canonical(bytes)).map(|(key, _)| &**key)
    }

    pub fn is_interned(&self, bytes: &[u8]) -> bool {
        self.table.contains_key(canonical(bytes))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Bytes held by interned strings. Handles carry no zero terminator, so
    /// each string counts exactly its content length.
    pub fn heap_usage(&self) -> usize {
        self.heap_usage
    }

    /// Pool header, slot array and interned bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.table.slot_bytes() + self.heap_usage
    }

    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }

    /// Every interned handle, in slot order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            it: self.table.iter(),
        }
    }
}

pub struct Iter<'a> {
    it: SlotIter<'a, Box<[u8]>, ()>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(key, _)| &**key)
    }
}

impl<'a> IntoIterator for &'a StringPool {
    type Item = &'a [u8];
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const PHONETIC: [&str; 26] = [
        "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India",
        "Juliett", "Kilo", "Lima", "Mike", "November", "Oscar", "Papa", "Quebec", "Romeo",
        "Sierra", "Tango", "Uniform", "Victor", "Whiskey", "X-ray", "Yankee", "Zulu",
    ];

    /// Invariant: equal content yields the same buffer, whatever the input pointer.
    #[test]
    fn interning_equal_content_returns_same_handle() {
        let mut pool = StringPool::new();
        let first = pool.intern(b"token").as_ptr();
        let copy = String::from("token");
        let second = pool.intern(copy.as_bytes()).as_ptr();
        assert_eq!(first, second);
        assert_eq!(pool.len(), 1);
    }

    /// Invariant: a hit allocates nothing; heap usage only grows on a miss.
    #[test]
    fn repeated_interning_does_not_grow_heap_usage() {
        let mut pool = StringPool::new();
        for word in PHONETIC {
            pool.intern(word.as_bytes());
        }
        let heap = pool.heap_usage();
        let expected: usize = PHONETIC.iter().map(|w| w.len()).sum();
        assert_eq!(heap, expected);

        for word in PHONETIC {
            assert_eq!(pool.intern(word.as_bytes()), word.as_bytes());
        }
        assert_eq!(pool.heap_usage(), heap);
        assert_eq!(pool.len(), PHONETIC.len());
    }

    #[test]
    fn handle_is_pool_owned_copy() {
        let mut pool = StringPool::new();
        let source = b"owned".to_vec();
        let handle = pool.intern(&source).as_ptr();
        assert_ne!(handle, source.as_ptr());
        drop(source);
        assert_eq!(pool.get(b"owned").map(<[u8]>::as_ptr), Some(handle));
    }

    /// Invariant: content stops at the first zero byte.
    #[test]
    fn embedded_zero_truncates_content() {
        let mut pool = StringPool::new();
        let a = pool.intern(b"ab\0cd").as_ptr();
        assert_eq!(pool.get(b"ab"), Some(&b"ab"[..]));
        let b = pool.intern(b"ab").as_ptr();
        let c = pool.intern(b"ab\0xy").as_ptr();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.heap_usage(), 2);
    }

    #[test]
    fn is_interned_does_not_create() {
        let mut pool = StringPool::new();
        assert!(!pool.is_interned(b"ghost"));
        assert!(pool.get(b"ghost").is_none());
        assert!(pool.is_empty());
        pool.intern(b"ghost");
        assert!(pool.is_interned(b"ghost"));
    }

    #[test]
    fn iteration_covers_vocabulary() {
        let mut pool = StringPool::new();
        for word in PHONETIC {
            pool.intern(word.as_bytes());
        }
        let seen: BTreeSet<&[u8]> = pool.iter().collect();
        let expected: BTreeSet<&[u8]> = PHONETIC.iter().map(|w| w.as_bytes()).collect();
        assert_eq!(seen, expected);
        assert!(pool.memory_usage() > pool.heap_usage());
    }

    /// Invariant: a bad load factor falls back to the pool's own growth policy.
    #[test]
    fn invalid_load_factor_falls_back_to_pool_default() {
        let pool = StringPool::with_config(TableConfig::STRING_POOL.with_load_factor(1.5));
        let stats = pool.stats();
        assert_eq!(stats.capacity, 16);
        assert_eq!(stats.threshold, 13);
    }

    #[test]
    fn empty_string_is_a_valid_handle() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(b""), b"");
        assert_eq!(pool.intern(b"\0tail"), b"");
        assert_eq!(pool.len(), 1);
    }
}
