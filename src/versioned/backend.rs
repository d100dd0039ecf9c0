//!
//! # Backend of the versioned cell
//!
//! Owns the sparse `version -> value` map and implements the hooks the
//! segment machinery drives it with.
//!

use crate::{
    ambient,
    common::{alloc_cell_id, CellID, VersionID},
    segment::{self, CellOps},
};
use parking_lot::RwLock;
use ruc::*;
use std::{collections::BTreeMap, sync::Arc};

#[derive(Debug)]
pub(super) struct RawCell<T> {
    id: CellID,
    // entries exist only for segments this cell was written in
    versions: RwLock<BTreeMap<VersionID, T>>,
}

impl<T> RawCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[inline(always)]
    pub(super) fn create() -> Arc<Self> {
        Arc::new(Self {
            id: alloc_cell_id(),
            versions: RwLock::new(BTreeMap::new()),
        })
    }

    /// The value visible to the ambient revision: the nearest entry on
    /// the chain from its current segment toward the root.
    pub(super) fn get(&self) -> Option<T> {
        let mut ver = ambient::revision().current_version();
        loop {
            if let Some(v) = self.versions.read().get(&ver) {
                return Some(v.clone());
            }
            ver = segment::parent_of(ver)?;
        }
    }

    /// Write under the current segment of the ambient revision.
    #[inline(always)]
    pub(super) fn set(this: &Arc<Self>, value: T) -> Result<()> {
        Self::store_at(this, ambient::revision().current_version(), value).c(d!())
    }

    /// How many segments currently hold an entry for this cell.
    #[inline(always)]
    pub(super) fn version_count(&self) -> usize {
        self.versions.read().len()
    }

    // The one write path, shared by `set`, collapse migration and branch
    // merge: register in the segment's write set on first contact, then
    // store. Only the task owning the segment reaches this, so the
    // check-then-register pair cannot race with itself.
    fn store_at(this: &Arc<Self>, ver: VersionID, value: T) -> Result<()> {
        if !this.versions.read().contains_key(&ver) {
            segment::register_write(ver, this.id, Arc::clone(this) as Arc<dyn CellOps>)
                .c(d!())?;
        }
        this.versions.write().insert(ver, value);
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn id(&self) -> CellID {
        self.id
    }
}

impl<T> CellOps for RawCell<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn on_release(&self, ver: VersionID) {
        self.versions.write().remove(&ver);
    }

    fn on_collapse(
        self: Arc<Self>,
        dst_ver: VersionID,
        parent_ver: VersionID,
    ) -> Result<()> {
        let migrate = {
            let vers = self.versions.read();
            alt!(
                vers.contains_key(&dst_ver),
                None,
                vers.get(&parent_ver).cloned()
            )
        };
        if let Some(v) = migrate {
            Self::store_at(&self, dst_ver, v).c(d!())?;
        }
        self.versions.write().remove(&parent_ver);
        Ok(())
    }

    fn on_merge(
        self: Arc<Self>,
        dst_ver: VersionID,
        head_ver: VersionID,
        join_ver: VersionID,
    ) -> Result<()> {
        // locate the newest write of the joined branch for this cell
        let mut ver = head_ver;
        loop {
            if self.versions.read().contains_key(&ver) {
                break;
            }
            match segment::parent_of(ver) {
                Some(p) => ver = p,
                None => return Ok(()),
            }
        }
        if ver != join_ver {
            // a later segment of the same branch supersedes this write
            return Ok(());
        }
        let value = self.versions.read().get(&join_ver).cloned();
        if let Some(v) = value {
            Self::store_at(&self, dst_ver, v).c(d!())?;
        }
        Ok(())
    }
}
