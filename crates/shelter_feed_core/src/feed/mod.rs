//! Activity feed engine: filter parsing, normalization, merge and page assembly.
//!
//! # Responsibility
//! - Hold the pure steps between the source readers and the caller.
//!
//! # Invariants
//! - Nothing in this module performs I/O; the readers live in `repo`.
//! - Items reaching `merge` are already scoped to one group.

pub mod filter;
pub mod merge;
pub mod normalize;
pub mod response;
