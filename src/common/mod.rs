//!
//! # Common components
//!
//! Process-wide identities shared by the segment DAG and the cells.
//!

use std::sync::atomic::{AtomicU64, Ordering};

/// The integer identity of a segment, assigned at segment creation and
/// unique for the lifetime of the process. Later-created segments get
/// bigger numbers; the ordering is only used for keying, never for
/// correctness.
pub type VersionID = u64;

/// The identity of a versioned cell, used to key segment write sets.
pub(crate) type CellID = u64;

// Monotonic and never reused; the u64 space outlives any realistic
// process, so wrap-around is not handled.
static VER_ID_ALLOC: AtomicU64 = AtomicU64::new(0);
static CELL_ID_ALLOC: AtomicU64 = AtomicU64::new(0);

#[inline(always)]
pub(crate) fn alloc_ver_id() -> VersionID {
    VER_ID_ALLOC.fetch_add(1, Ordering::Relaxed)
}

#[inline(always)]
pub(crate) fn alloc_cell_id() -> CellID {
    CELL_ID_ALLOC.fetch_add(1, Ordering::Relaxed)
}
