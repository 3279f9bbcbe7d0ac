//! CellarTable: coalesced hashing with a cellar reserved for overflow.
//!
//! The slot array is split in two. The primary region (the first
//! `table_capacity` slots) is addressed directly by `hash % table_capacity`;
//! the cellar (the last `cellar_capacity` slots) is only ever reached
//! through a successor link. A collision appends a fresh slot to the end of
//! the chain that starts at the primary bucket, taking it from the cellar
//! while the cellar has room and otherwise probing the primary region.
//! Probed slots may later be the primary bucket of another hash, so chains
//! can merge ("coalesce"); lookups therefore compare the stored hash and key
//! bytes of every slot on the walk.
//!
//! Keys are plain byte strings. Whether the table owns a copy of each key
//! or borrows the caller's bytes is decided by the key type through
//! [`AdoptKey`], so the owning string pool and the borrowing frequency map
//! share this one implementation.

use crate::config::TableConfig;
use crate::error::{IntegrityError, TableError};

/// Load factor installed when both the configured load factor and the
/// configured default are out of range.
pub const DEFAULT_LOAD_FACTOR: f32 = TableConfig::FREQUENCY_MAP.load_factor;

/// Polynomial byte hash (seed 5381, multiplier 33) over every byte of `bytes`.
///
/// Zero bytes are hashed like any other byte.
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(5381u32, |h, &b| h.wrapping_mul(33).wrapping_add(u32::from(b)))
}

/// Read access to the bytes a stored key stands for.
pub trait SlotKey {
    fn key_bytes(&self) -> &[u8];
}

/// Ownership policy: turns a lookup key into the value stored in a slot.
///
/// `Box<[u8]>` copies the bytes into an allocation owned by the table.
/// `&'k [u8]` stores the caller's reference unchanged; the caller's memory
/// must outlive the table, which the borrow checker enforces through `'k`.
pub trait AdoptKey<'k>: SlotKey {
    const OWNS_KEY: bool;
    fn adopt(bytes: &'k [u8]) -> Self;
}

impl SlotKey for Box<[u8]> {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl<'k> AdoptKey<'k> for Box<[u8]> {
    const OWNS_KEY: bool = true;
    fn adopt(bytes: &'k [u8]) -> Self {
        Box::from(bytes)
    }
}

impl<'a> SlotKey for &'a [u8] {
    #[inline]
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl<'k> AdoptKey<'k> for &'k [u8] {
    const OWNS_KEY: bool = false;
    #[inline]
    fn adopt(bytes: &'k [u8]) -> Self {
        bytes
    }
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u32,
}

#[derive(Debug)]
struct Slot<K, V> {
    entry: Option<Entry<K, V>>,
    next: Option<usize>,
}

impl<K, V> Slot<K, V> {
    const fn vacant() -> Self {
        Slot {
            entry: None,
            next: None,
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.entry.is_none() && self.next.is_none()
    }
}

fn allocate_slots<K, V>(capacity: usize) -> Result<Vec<Slot<K, V>>, TableError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity)?;
    slots.resize_with(capacity, Slot::vacant);
    Ok(slots)
}

/// Where `find_or_create` put (or found) the entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Placement {
    /// The key was already present.
    Found,
    /// Created in its own empty primary bucket.
    InPlace,
    /// Created in a free slot linked onto an existing chain.
    Chained,
}

impl Placement {
    #[inline]
    pub fn created(self) -> bool {
        !matches!(self, Placement::Found)
    }
}

/// Snapshot of a table's geometry and occupancy.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TableStats {
    pub capacity: usize,
    pub table_capacity: usize,
    pub cellar_capacity: usize,
    pub size: usize,
    pub cellar_size: usize,
    pub threshold: usize,
}

pub struct CellarTable<K, V> {
    slots: Vec<Slot<K, V>>,
    table_capacity: usize,
    cellar_capacity: usize,
    size: usize,
    cellar_size: usize,
    threshold: usize,
    load_factor: f32,
    default_load_factor: f32,
    cellar_ratio: f32,
}

/// Occupied entries in slot order.
pub struct Iter<'a, K, V> {
    it: std::slice::Iter<'a, Slot<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .by_ref()
            .find_map(|s| s.entry.as_ref().map(|e| (&e.key, &e.value)))
    }
}

impl<K, V> Default for CellarTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CellarTable<K, V> {
    pub fn new() -> Self {
        Self::with_config(TableConfig::default())
    }

    /// # Panics
    /// If `try_with_config` would fail.
    pub fn with_config(config: TableConfig) -> Self {
        match Self::try_with_config(config) {
            Ok(table) => table,
            Err(e) => panic!("cellar table construction failed: {e}"),
        }
    }

    /// Build an empty table. An out-of-range load factor is replaced by the
    /// config's `default_load_factor` (or [`DEFAULT_LOAD_FACTOR`] when that
    /// is out of range too) rather than rejected.
    pub fn try_with_config(config: TableConfig) -> Result<Self, TableError> {
        if config.initial_capacity == 0 {
            return Err(TableError::ZeroCapacity);
        }
        if !TableConfig::is_fraction(config.cellar_ratio) {
            return Err(TableError::InvalidCellarRatio(config.cellar_ratio));
        }
        let default_load_factor = if TableConfig::is_fraction(config.default_load_factor) {
            config.default_load_factor
        } else {
            log::warn!(
                "default load factor {} is outside (0, 1); using {}",
                config.default_load_factor,
                DEFAULT_LOAD_FACTOR
            );
            DEFAULT_LOAD_FACTOR
        };
        let load_factor = if TableConfig::is_fraction(config.load_factor) {
            config.load_factor
        } else {
            log::warn!(
                "load factor {} is outside (0, 1); using {}",
                config.load_factor,
                default_load_factor
            );
            default_load_factor
        };
        let mut table = Self {
            slots: allocate_slots(config.initial_capacity)?,
            table_capacity: 0,
            cellar_capacity: 0,
            size: 0,
            cellar_size: 0,
            threshold: 0,
            load_factor,
            default_load_factor,
            cellar_ratio: config.cellar_ratio,
        };
        table.apply_geometry();
        Ok(table)
    }

    fn apply_geometry(&mut self) {
        let capacity = self.slots.len();
        // cellar_ratio < 1 keeps at least one primary slot.
        self.cellar_capacity = (capacity as f64 * f64::from(self.cellar_ratio)) as usize;
        self.table_capacity = capacity - self.cellar_capacity;
        self.threshold = Self::threshold_for(capacity, self.load_factor);
    }

    fn threshold_for(capacity: usize, load_factor: f32) -> usize {
        (capacity as f64 * f64::from(load_factor)) as usize
    }

    pub fn len(&self) -> usize {
        self.size
    }
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Size of the slot array itself, excluding anything keys point to.
    pub fn slot_bytes(&self) -> usize {
        self.capacity() * std::mem::size_of::<Slot<K, V>>()
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            capacity: self.capacity(),
            table_capacity: self.table_capacity,
            cellar_capacity: self.cellar_capacity,
            size: self.size,
            cellar_size: self.cellar_size,
            threshold: self.threshold,
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
        }
    }

    /// Drop every entry; capacity is kept.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::vacant();
        }
        self.size = 0;
        self.cellar_size = 0;
    }

    /// Change the growth threshold. A value outside `(0, 1)` is treated as a
    /// misconfiguration: the table's default load factor is restored and the table is
    /// rehashed immediately.
    pub fn set_load_factor(&mut self, load_factor: f32) {
        if TableConfig::is_fraction(load_factor) {
            self.load_factor = load_factor;
            self.threshold = Self::threshold_for(self.capacity(), load_factor);
        } else {
            self.restore_default_load_factor(load_factor);
        }
    }

    fn restore_default_load_factor(&mut self, rejected: f32) {
        log::warn!(
            "invalid load factor {rejected}; resetting to {} and rehashing",
            self.default_load_factor
        );
        self.load_factor = self.default_load_factor;
        self.grow();
    }

    /// Double the capacity and re-insert every entry.
    ///
    /// # Panics
    /// If the new slot array cannot be allocated.
    pub fn grow(&mut self) {
        if let Err(e) = self.try_grow() {
            panic!("cellar table growth failed: {e}");
        }
    }

    pub fn try_grow(&mut self) -> Result<(), TableError> {
        let old_capacity = self.capacity();
        let capacity = old_capacity
            .checked_mul(2)
            .ok_or(TableError::CapacityOverflow)?;
        let fresh = allocate_slots(capacity)?;
        let old = std::mem::replace(&mut self.slots, fresh);
        let moved = self.size;
        self.size = 0;
        self.cellar_size = 0;
        self.apply_geometry();
        // Chains are rebuilt from scratch; only the entries carry over.
        for entry in old.into_iter().filter_map(|slot| slot.entry) {
            self.insert_unique(entry);
        }
        debug_assert_eq!(self.size, moved);
        log::debug!("cellar table grew from {old_capacity} to {capacity} slots ({moved} entries)");
        Ok(())
    }

    #[inline]
    fn primary(&self, hash: u32) -> usize {
        hash as usize % self.table_capacity
    }

    fn chain_end(&self, hash: u32) -> usize {
        let mut i = self.primary(hash);
        while let Some(next) = self.slots[i].next {
            i = next;
        }
        i
    }

    fn insert_unique(&mut self, entry: Entry<K, V>) {
        let tail = self.chain_end(entry.hash);
        let slot = match self.vacancy(tail) {
            Some(slot) => slot,
            None => self.corrupted(),
        };
        self.occupy(tail, slot, entry);
    }

    /// Pick the slot a new entry for the chain ending at `tail` goes into.
    fn vacancy(&mut self, tail: usize) -> Option<usize> {
        if self.slots[tail].is_empty() {
            return Some(tail);
        }
        if self.cellar_size < self.cellar_capacity {
            // The cellar fills from the last slot downwards.
            self.cellar_size += 1;
            let slot = self.capacity() - self.cellar_size;
            debug_assert!(self.slots[slot].is_empty());
            return Some(slot);
        }
        let table = self.table_capacity;
        if tail < table {
            (1..table)
                .map(|step| (tail + step) % table)
                .find(|&i| self.slots[i].is_empty())
        } else {
            (0..table).find(|&i| self.slots[i].is_empty())
        }
    }

    fn occupy(&mut self, tail: usize, slot: usize, entry: Entry<K, V>) -> Placement {
        self.slots[slot].entry = Some(entry);
        self.size += 1;
        if slot == tail {
            Placement::InPlace
        } else {
            self.slots[tail].next = Some(slot);
            Placement::Chained
        }
    }

    /// No free slot although the table claims spare room. Growth keeps
    /// `size <= threshold < capacity` before every insertion, so reaching
    /// this means the slot array was corrupted.
    #[cold]
    fn corrupted(&self) -> ! {
        log::error!(
            "no free slot with {} of {} slots occupied; table is corrupted",
            self.size,
            self.capacity()
        );
        panic!(
            "cellar table corrupted: no free slot with {} of {} slots occupied",
            self.size,
            self.capacity()
        );
    }

    fn entry_at(&mut self, i: usize, placement: Placement) -> (&K, &mut V, Placement) {
        let entry = self.slots[i]
            .entry
            .as_mut()
            .expect("located slot must hold an entry");
        (&entry.key, &mut entry.value, placement)
    }
}

impl<K: SlotKey, V> CellarTable<K, V> {
    /// Walk the chain for `hash`. `Ok(slot)` holds the matching entry;
    /// `Err(slot)` is the end of the chain (the primary bucket itself when
    /// it is empty).
    fn locate(&self, hash: u32, key: &[u8]) -> Result<usize, usize> {
        let mut i = self.primary(hash);
        loop {
            let slot = &self.slots[i];
            if let Some(entry) = &slot.entry {
                if entry.hash == hash && entry.key.key_bytes() == key {
                    return Ok(i);
                }
            }
            match slot.next {
                Some(next) => {
                    debug_assert!(next < self.slots.len());
                    i = next;
                }
                None => return Err(i),
            }
        }
    }

    pub fn find(&self, key: &[u8]) -> Option<(&K, &V)> {
        let i = self.locate(hash_bytes(key), key).ok()?;
        self.slots[i].entry.as_ref().map(|e| (&e.key, &e.value))
    }

    pub fn find_mut(&mut self, key: &[u8]) -> Option<(&K, &mut V)> {
        let i = self.locate(hash_bytes(key), key).ok()?;
        self.slots[i].entry.as_mut().map(|e| (&e.key, &mut e.value))
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.locate(hash_bytes(key), key).is_ok()
    }

    /// Return the entry for `key`, creating it with `default()` on a miss.
    ///
    /// A miss while `len() > threshold` grows the table first, so the
    /// insertion itself never triggers a rehash. `default` only runs when
    /// an entry is created.
    pub fn find_or_create<'k, F>(&mut self, key: &'k [u8], default: F) -> (&K, &mut V, Placement)
    where
        K: AdoptKey<'k>,
        F: FnOnce() -> V,
    {
        let hash = hash_bytes(key);
        let mut tail = match self.locate(hash, key) {
            Ok(found) => return self.entry_at(found, Placement::Found),
            Err(tail) => tail,
        };
        if self.size > self.threshold {
            while self.size > self.threshold {
                self.grow();
            }
            tail = self.chain_end(hash);
        }
        let slot = match self.vacancy(tail) {
            Some(slot) => slot,
            None => {
                // A full table with `size < capacity` is corruption; a full
                // table at capacity means the load factor let it fill up.
                if self.size < self.capacity() {
                    self.corrupted();
                }
                let rejected = self.load_factor;
                self.restore_default_load_factor(rejected);
                tail = self.chain_end(hash);
                match self.vacancy(tail) {
                    Some(slot) => slot,
                    None => self.corrupted(),
                }
            }
        };
        let entry = Entry {
            key: K::adopt(key),
            value: default(),
            hash,
        };
        let placement = self.occupy(tail, slot, entry);
        self.entry_at(slot, placement)
    }

    /// Verify the structural invariants: every successor is in range, every
    /// occupied slot is reachable from its primary bucket without revisiting
    /// a slot, `len()` matches the occupied slots, and the cellar count is
    /// within bounds.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        let capacity = self.capacity();
        let mut counted = 0;
        for (slot, s) in self.slots.iter().enumerate() {
            if let Some(next) = s.next {
                if next >= capacity {
                    return Err(IntegrityError::SuccessorOutOfRange { slot, next });
                }
            }
            let Some(entry) = &s.entry else { continue };
            counted += 1;
            let start = self.primary(entry.hash);
            let mut i = start;
            let mut steps = 0;
            while i != slot {
                i = match self.slots[i].next {
                    Some(next) if next < capacity => next,
                    Some(next) => return Err(IntegrityError::SuccessorOutOfRange { slot: i, next }),
                    None => return Err(IntegrityError::Unreachable { slot }),
                };
                steps += 1;
                if steps > capacity {
                    return Err(IntegrityError::Cycle { start });
                }
            }
        }
        if counted != self.size {
            return Err(IntegrityError::SizeMismatch {
                recorded: self.size,
                counted,
            });
        }
        if self.cellar_size > self.cellar_capacity {
            return Err(IntegrityError::CellarOverflow {
                cellar_size: self.cellar_size,
                cellar_capacity: self.cellar_capacity,
            });
        }
        Ok(())
    }
}
