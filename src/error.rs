//! Error types for table construction and structural self-checks.

use std::collections::TryReserveError;
use thiserror::Error;

/// Failure to build or grow a cellar table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("initial capacity must be at least one slot")]
    ZeroCapacity,
    #[error("cellar ratio {0} is outside (0, 1)")]
    InvalidCellarRatio(f32),
    #[error("doubling the table capacity overflows usize")]
    CapacityOverflow,
    #[error("unable to allocate slot storage: {0}")]
    Allocation(#[from] TryReserveError),
}

/// A broken structural invariant found by `CellarTable::check_integrity`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("slot {slot} is not reachable from its primary bucket")]
    Unreachable { slot: usize },
    #[error("successor chain starting at slot {start} contains a cycle")]
    Cycle { start: usize },
    #[error("slot {slot} links to out-of-range successor {next}")]
    SuccessorOutOfRange { slot: usize, next: usize },
    #[error("recorded size {recorded} but {counted} slots are occupied")]
    SizeMismatch { recorded: usize, counted: usize },
    #[error("cellar holds {cellar_size} entries but has room for {cellar_capacity}")]
    CellarOverflow {
        cellar_size: usize,
        cellar_capacity: usize,
    },
}
