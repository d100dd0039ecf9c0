//!
//! # Revision
//!
//! A logical branch of execution. [`fork`] starts a user action in a
//! fresh revision on its own task; [`Revision::join`] waits for it and
//! publishes the branch's writes into the joining revision, the newest
//! write of the branch winning per cell.
//!
//! # Example
//!
//! ```
//! use crevs::{fork, Versioned};
//!
//! let x = Versioned::initialized(0_i32);
//!
//! let xr = x.clone();
//! let r = fork(move || {
//!     xr.set(1).unwrap();
//!     xr.set(2).unwrap();
//! })
//! .unwrap();
//!
//! r.join().unwrap();
//! assert_eq!(Some(2), x.get());
//! ```
//!

#[cfg(test)]
mod test;

use crate::{ambient, common::VersionID, segment};
use parking_lot::RwLock;
use ruc::*;
use std::{sync::Arc, thread};

/// Control block of one revision, shared between the owning task and the
/// `Revision` handle returned by `fork`.
pub(crate) struct RevCtl {
    // the parent's current segment at the instant of fork; a parentless
    // root segment for standalone revisions
    root: VersionID,
    // all reads and writes of the owning task go through this segment
    current: RwLock<VersionID>,
}

impl RevCtl {
    /// A root segment plus a writable segment on top of it; installed
    /// for tasks that touch cells without ever having been forked.
    pub(crate) fn standalone() -> Result<Arc<Self>> {
        let root = segment::create(None).c(d!())?;
        let current = segment::create(Some(root)).c(d!())?;
        Ok(Arc::new(Self {
            root,
            current: RwLock::new(current),
        }))
    }

    #[inline(always)]
    pub(crate) fn current_version(&self) -> VersionID {
        *self.current.read()
    }

    /// Install the fork point: the child revision roots at the caller's
    /// current segment and both sides continue on fresh private
    /// segments. The fork point keeps a count from each new child until
    /// the caller's own role on it is dropped, so it can never
    /// transiently die.
    fn fork_ctl(&self) -> Result<Arc<Self>> {
        let at = self.current_version();

        segment::incref(at).c(d!())?; // the child's `root` role
        let child = segment::create(Some(at)).c(d!())?;
        let next = segment::create(Some(at)).c(d!())?;

        *self.current.write() = next;
        segment::release(at).c(d!())?; // the caller's `current` role moves off

        Ok(Arc::new(Self {
            root: at,
            current: RwLock::new(child),
        }))
    }
}

impl Drop for RevCtl {
    fn drop(&mut self) {
        // nobody can reach the revision anymore; its roles go with it
        pnk!(segment::release(*self.current.get_mut()));
        pnk!(segment::release(self.root));
    }
}

/// Handle of a forked revision.
///
/// Joining consumes the handle, so a revision can be joined at most
/// once. Dropping an unjoined handle waits for its task and discards the
/// branch.
pub struct Revision {
    ctl: Arc<RevCtl>,
    task: Option<thread::JoinHandle<()>>,
}

/// Fork the ambient revision: run `action` in a fresh child revision on
/// its own task, in parallel with the caller. Cells captured by the
/// action read the fork-point state until the child itself writes them.
pub fn fork<F>(action: F) -> Result<Revision>
where
    F: FnOnce() + Send + 'static,
{
    let ctl = ambient::revision().fork_ctl().c(d!())?;

    let hand_off = Arc::clone(&ctl);
    let task = thread::Builder::new()
        .name(format!("revision-{}", ctl.current_version()))
        .spawn(move || {
            ambient::install(hand_off);
            action();
        })
        .c(d!())?;

    Ok(Revision {
        ctl,
        task: Some(task),
    })
}

impl Revision {
    /// Wait for the forked action, publish the branch's writes into the
    /// ambient revision (the newest write per cell wins within the
    /// branch), then compress the ambient chain.
    ///
    /// A panicking action surfaces here as an error and its branch is
    /// discarded; joining a revision that was not forked from the
    /// ambient revision fails without merging.
    pub fn join(mut self) -> Result<()> {
        let main = ambient::revision();

        if let Some(task) = self.task.take() {
            task.join()
                .map_err(|_| eg!("the forked action panicked, branch discarded"))?;
        }

        let dst = main.current_version();
        alt!(
            !segment::is_ancestor(self.ctl.root, dst),
            return Err(eg!("revision was not forked from the joining revision"))
        );

        // fold the branch, newest segment first; the per-cell guard in
        // `on_merge` makes the visiting order irrelevant
        let head = self.ctl.current_version();
        let mut s = head;
        while s != self.ctl.root {
            let (cells, parent) = segment::written_snapshot(s).c(d!())?;
            for cell in cells {
                cell.on_merge(dst, head, s).c(d!())?;
            }
            s = parent.c(d!("branch chain broke before its root"))?;
        }

        // the joined branch goes away before the ambient chain is
        // compressed, so its fork point can be folded as well
        drop(self);
        segment::collapse(main.root, dst).c(d!())
    }

    /// Whether the forked action has finished, without waiting for it.
    #[inline(always)]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(|t| t.is_finished()).unwrap_or(true)
    }
}

impl Drop for Revision {
    fn drop(&mut self) {
        // an unjoined revision may still be running; wait it out so the
        // branch is quiescent when its segments release
        if let Some(task) = self.task.take() {
            task.join().ok();
        }
    }
}
