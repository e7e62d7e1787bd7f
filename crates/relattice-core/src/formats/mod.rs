//! # Formats Module
//!
//! On-disk document layout for Relattice graphs.
//! File I/O lives in the `storage` module.

mod persistence;

pub use persistence::*;
