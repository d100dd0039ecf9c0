//!
//! # Ambient revision context
//!
//! The per-task slot answering "which revision is this task executing
//! in". Tasks that were never forked get a fresh standalone revision
//! installed on first touch; forked tasks get their revision installed
//! before the user action runs. The slot drops with its task, so lazily
//! created revisions release their segments when the task exits.
//!

use crate::revision::RevCtl;
use ruc::*;
use std::{cell::RefCell, sync::Arc};

thread_local! {
    static AMBIENT: RefCell<Option<Arc<RevCtl>>> = RefCell::new(None);
}

/// The ambient revision of the calling task, installing a standalone
/// revision first if the task has none.
pub(crate) fn revision() -> Arc<RevCtl> {
    AMBIENT.with(|slot| {
        let mut slot = slot.borrow_mut();
        Arc::clone(slot.get_or_insert_with(|| pnk!(RevCtl::standalone())))
    })
}

/// Hand a forked task its revision; must run before the user action.
pub(crate) fn install(ctl: Arc<RevCtl>) {
    AMBIENT.with(|slot| {
        *slot.borrow_mut() = Some(ctl);
    });
}
