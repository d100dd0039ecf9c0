//!
//! # Segment DAG
//!
//! Core bookkeeping of the runtime. A segment is a node of the version
//! DAG recording which cells were written while it was the `current`
//! segment of some revision; reads resolve by walking parent links
//! toward a root. Segments are reference counted: each child segment,
//! each revision naming one as its `current`, and each revision naming
//! one as its `root` holds a count.
//!


use crate::common::{alloc_ver_id, CellID, VersionID};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use ruc::*;
use std::{collections::HashMap, sync::Arc};

////////////////////////////////////////////////////////////////////////////////////
////////////////////////////////////////////////////////////////////////////////////

/// The capability set a versioned cell exposes to the segment machinery.
///
/// Segments know nothing about element types; they drive cell-side
/// bookkeeping through these hooks, keyed by segment identity only.
pub(crate) trait CellOps: Send + Sync {
    /// The segment keyed by `ver` is going away; erase its entry.
    fn on_release(&self, ver: VersionID);

    /// `parent_ver` is being folded into `dst_ver`: keep the value
    /// reachable from `dst_ver`, then erase the parent entry.
    fn on_collapse(
        self: Arc<Self>,
        dst_ver: VersionID,
        parent_ver: VersionID,
    ) -> Result<()>;

    /// The branch headed by `head_ver` is being joined into `dst_ver`;
    /// publish the entry keyed by `join_ver` only if it is the newest
    /// write of the whole branch.
    fn on_merge(
        self: Arc<Self>,
        dst_ver: VersionID,
        head_ver: VersionID,
        join_ver: VersionID,
    ) -> Result<()>;
}

struct SegmentNode {
    parent: Option<VersionID>,
    refcount: u64,
    written: HashMap<CellID, Arc<dyn CellOps>>,
}

// One id-keyed store for the whole process; revisions and cells refer
// to segments by `VersionID` only.
static DAG: Lazy<RwLock<HashMap<VersionID, SegmentNode>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

////////////////////////////////////////////////////////////////////////////////////
////////////////////////////////////////////////////////////////////////////////////

/// Allocate a fresh segment. The initial count stands for the revision
/// role the creator takes on it; a non-null parent gains a count for the
/// new child link.
pub(crate) fn create(parent: Option<VersionID>) -> Result<VersionID> {
    let ver = alloc_ver_id();
    let mut dag = DAG.write();
    if let Some(p) = parent {
        dag.get_mut(&p).c(d!("parent segment not found"))?.refcount += 1;
    }
    dag.insert(
        ver,
        SegmentNode {
            parent,
            refcount: 1,
            written: HashMap::new(),
        },
    );
    Ok(ver)
}

/// Take one more count on a live segment (a revision adopting it as its
/// `root`).
pub(crate) fn incref(ver: VersionID) -> Result<()> {
    DAG.write()
        .get_mut(&ver)
        .c(d!("segment not found"))?
        .refcount += 1;
    Ok(())
}

/// Drop one count. A segment reaching zero notifies every cell it
/// recorded a write for, then cascades to its parent.
pub(crate) fn release(ver: VersionID) -> Result<()> {
    // collect the casualties first, notify cells after the lock is gone
    let mut dead: Vec<(VersionID, Vec<Arc<dyn CellOps>>)> = vec![];
    {
        let mut dag = DAG.write();
        let mut cur = Some(ver);
        while let Some(v) = cur {
            let remaining = {
                let node = dag.get_mut(&v).c(d!("segment not found"))?;
                node.refcount -= 1;
                node.refcount
            };
            if 0 < remaining {
                break;
            }
            let node = dag.remove(&v).c(d!())?;
            dead.push((v, node.written.into_values().collect()));
            cur = node.parent;
        }
    }
    dead.iter().for_each(|(v, cells)| {
        cells.iter().for_each(|cell| cell.on_release(*v));
    });
    Ok(())
}

/// Record that `cell` wrote under `ver`; registering an already
/// registered cell is a no-op.
pub(crate) fn register_write(
    ver: VersionID,
    id: CellID,
    cell: Arc<dyn CellOps>,
) -> Result<()> {
    DAG.write()
        .get_mut(&ver)
        .c(d!("segment not found"))?
        .written
        .insert(id, cell);
    Ok(())
}

/// Parent link of a live segment; `None` for roots and for already
/// released ids.
pub(crate) fn parent_of(ver: VersionID) -> Option<VersionID> {
    DAG.read().get(&ver).and_then(|n| n.parent)
}

/// The write set and parent link of one segment, cloned out so callers
/// can invoke cell hooks without holding the store lock.
pub(crate) fn written_snapshot(
    ver: VersionID,
) -> Result<(Vec<Arc<dyn CellOps>>, Option<VersionID>)> {
    let dag = DAG.read();
    let node = dag.get(&ver).c(d!("segment not found"))?;
    Ok((node.written.values().cloned().collect(), node.parent))
}

/// Whether `ancestor` lies on the parent chain of `ver` (inclusive).
pub(crate) fn is_ancestor(ancestor: VersionID, ver: VersionID) -> bool {
    let dag = DAG.read();
    let mut cur = Some(ver);
    while let Some(v) = cur {
        if v == ancestor {
            return true;
        }
        cur = dag.get(&v).and_then(|n| n.parent);
    }
    false
}

/// Compress the run of exclusively-owned ancestors above `current`,
/// stopping at `root` or at the first still-shared parent. Entries keyed
/// by a skipped parent are migrated into `current`, or discarded when
/// `current` already wrote the cell, so reads keep resolving to the same
/// values afterwards.
pub(crate) fn collapse(root: VersionID, current: VersionID) -> Result<()> {
    loop {
        let (parent, cells) = {
            let dag = DAG.read();
            let cur = dag.get(&current).c(d!("segment not found"))?;
            let p = match cur.parent {
                Some(p) if p != root => p,
                _ => return Ok(()),
            };
            let pnode = dag.get(&p).c(d!("broken parent chain"))?;
            if 1 < pnode.refcount {
                return Ok(());
            }
            (p, pnode.written.values().cloned().collect::<Vec<_>>())
        };

        for cell in cells {
            cell.on_collapse(current, parent).c(d!())?;
        }

        // `parent` is exhausted; splice it out of the chain. Its one
        // count was the child link from `current`, and its own parent
        // link transfers to `current`, so no neighbour count changes.
        let mut dag = DAG.write();
        let pnode = dag.remove(&parent).c(d!())?;
        dag.get_mut(&current).c(d!())?.parent = pnode.parent;
    }
}

////////////////////////////////////////////////////////////////////////////////////
////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
pub(crate) fn refcount_of(ver: VersionID) -> Option<u64> {
    DAG.read().get(&ver).map(|n| n.refcount)
}

#[cfg(test)]
pub(crate) fn is_live(ver: VersionID) -> bool {
    DAG.read().contains_key(&ver)
}

#[cfg(test)]
pub(crate) fn has_write(ver: VersionID, id: CellID) -> bool {
    DAG.read()
        .get(&ver)
        .map(|n| n.written.contains_key(&id))
        .unwrap_or(false)
}
