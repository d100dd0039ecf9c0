#![doc = include_str!("../README.md")]
#![deny(warnings)]
#![cfg_attr(test, allow(warnings))]

pub mod common;

pub mod revision;

pub mod versioned;

pub(crate) mod ambient;
pub(crate) mod segment;

pub use common::VersionID;
pub use revision::{fork, Revision};
pub use versioned::{ValueMut, Versioned};
