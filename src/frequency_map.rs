//! FrequencyMap: non-owning byte-string counter over a cellar table.
//!
//! Keys are stored as the caller's `&'k [u8]` and never copied. In the
//! lexical pass they are handles borrowed from a [`StringPool`], so a map
//! per document aggregates over the corpus vocabulary without allocating
//! key storage.
//!
//! [`StringPool`]: crate::string_pool::StringPool

use crate::cellar::{CellarTable, Iter as SlotIter, TableStats};
use crate::config::TableConfig;
use crate::error::TableError;

pub struct FrequencyMap<'k> {
    table: CellarTable<&'k [u8], u32>,
}

impl<'k> Default for FrequencyMap<'k> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'k> FrequencyMap<'k> {
    pub fn new() -> Self {
        Self::with_config(TableConfig::FREQUENCY_MAP)
    }

    /// # Panics
    /// If the slot array cannot be built from `config`.
    pub fn with_config(config: TableConfig) -> Self {
        Self {
            table: CellarTable::with_config(config),
        }
    }

    pub fn try_with_config(config: TableConfig) -> Result<Self, TableError> {
        Ok(Self {
            table: CellarTable::try_with_config(config)?,
        })
    }

    /// Count stored for `key`; zero when absent.
    pub fn get(&self, key: &[u8]) -> u32 {
        self.table.find(key).map_or(0, |(_, &count)| count)
    }

    /// Store `value` for `key`, creating the entry on first use, and return
    /// the previous count (zero for a new entry).
    pub fn put(&mut self, key: &'k [u8], value: u32) -> u32 {
        let (_, count, _) = self.table.find_or_create(key, || 0);
        std::mem::replace(count, value)
    }

    /// Add one occurrence of `key` and return the new count.
    pub fn increment(&mut self, key: &'k [u8]) -> u32 {
        let (_, count, _) = self.table.find_or_create(key, || 0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.iter().map(|(_, count)| u64::from(count)).sum()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }

    pub fn iter(&self) -> Iter<'_, 'k> {
        Iter {
            it: self.table.iter(),
        }
    }
}

pub struct Iter<'a, 'k> {
    it: SlotIter<'a, &'k [u8], u32>,
}

impl<'a, 'k> Iterator for Iter<'a, 'k> {
    type Item = (&'k [u8], u32);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(&key, &count)| (key, count))
    }
}
