//!
//! # Versioned cell
//!
//! A shared variable whose value depends on which revision reads it.
//! Reads and writes always apply to the ambient revision of the calling
//! task; writes made inside a forked revision stay invisible to other
//! revisions until that revision is joined.
//!
//! # Example
//!
//! ```
//! use crevs::Versioned;
//!
//! let v = Versioned::initialized(7_u64);
//! assert_eq!(Some(7), v.get());
//!
//! v.set(8).unwrap();
//! assert_eq!(Some(8), v.get());
//!
//! *v.get_mut().unwrap() += 1;
//! assert_eq!(Some(9), v.get());
//! ```
//!

mod backend;

#[cfg(test)]
mod test;

use backend::RawCell;
use ruc::*;
use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

/// A versioned variable; clones are shared handles to the same cell.
#[derive(Debug)]
pub struct Versioned<T> {
    inner: Arc<RawCell<T>>,
}

impl<T> Clone for Versioned<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Versioned<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// A cell with no recorded value; `get` yields `None` until a write
    /// becomes visible.
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            inner: RawCell::create(),
        }
    }

    /// A cell whose initial value is recorded under the ambient revision
    /// of the constructing task.
    #[inline(always)]
    pub fn initialized(value: T) -> Self {
        let hdr = Self::new();
        pnk!(hdr.set(value));
        hdr
    }

    /// The value visible to the ambient revision.
    #[inline(always)]
    pub fn get(&self) -> Option<T> {
        self.inner.get()
    }

    /// A mutable view of the visible value, written back to the ambient
    /// revision when the guard drops; `None` on an uninitialized cell.
    #[inline(always)]
    pub fn get_mut(&self) -> Option<ValueMut<'_, T>> {
        self.get().map(move |value| ValueMut { hdr: self, value })
    }

    /// Write under the ambient revision.
    #[inline(always)]
    pub fn set(&self, value: T) -> Result<()> {
        RawCell::set(&self.inner, value).c(d!())
    }

    /// How many segments currently hold an entry for this cell; joined
    /// and collapsed histories keep this small.
    #[inline(always)]
    pub fn version_count(&self) -> usize {
        self.inner.version_count()
    }
}

impl<T> Default for Versioned<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<T> for Versioned<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(value: T) -> Self {
        Self::initialized(value)
    }
}

/// Write-back guard created by [`Versioned::get_mut`].
#[derive(Debug)]
pub struct ValueMut<'a, T>
where
    T: Clone + Send + Sync + 'static,
{
    hdr: &'a Versioned<T>,
    value: T,
}

impl<'a, T> Drop for ValueMut<'a, T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        pnk!(self.hdr.set(self.value.clone()));
    }
}

impl<'a, T> Deref for ValueMut<'a, T>
where
    T: Clone + Send + Sync + 'static,
{
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<'a, T> DerefMut for ValueMut<'a, T>
where
    T: Clone + Send + Sync + 'static,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}
