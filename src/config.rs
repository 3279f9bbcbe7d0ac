//! Construction parameters shared by every cellar table.

/// Sizing policy for a [`CellarTable`](crate::cellar::CellarTable).
///
/// `load_factor` and `cellar_ratio` are fractions in the open interval
/// `(0, 1)`. The cellar takes `floor(capacity * cellar_ratio)` slots from
/// the end of the slot array; the table grows once its size exceeds
/// `floor(capacity * load_factor)`. `default_load_factor` is installed in
/// place of an out-of-range `load_factor`, and is kept by the `with_*`
/// builders so a preset's own growth policy survives a bad override.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    pub initial_capacity: usize,
    pub load_factor: f32,
    pub cellar_ratio: f32,
    pub default_load_factor: f32,
}

impl TableConfig {
    /// Per-document token counters: small and kept sparse.
    pub const FREQUENCY_MAP: TableConfig = TableConfig {
        initial_capacity: 8,
        load_factor: 0.68,
        cellar_ratio: 0.14,
        default_load_factor: 0.68,
    };

    /// Corpus-wide interning pool: larger start, packed more densely.
    pub const STRING_POOL: TableConfig = TableConfig {
        initial_capacity: 16,
        load_factor: 0.86,
        cellar_ratio: 0.14,
        default_load_factor: 0.86,
    };

    pub const fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub const fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub const fn with_cellar_ratio(mut self, cellar_ratio: f32) -> Self {
        self.cellar_ratio = cellar_ratio;
        self
    }

    pub const fn with_default_load_factor(mut self, default_load_factor: f32) -> Self {
        self.default_load_factor = default_load_factor;
        self
    }

    pub(crate) fn is_fraction(x: f32) -> bool {
        x > 0.0 && x < 1.0
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::FREQUENCY_MAP
    }
}
