//! Feed domain model.
//!
//! # Responsibility
//! - Define the native record shapes the source readers return.
//! - Define the uniform `ActivityItem` the merge step consumes.
//!
//! # Invariants
//! - `(kind, id)` is the identity of an activity item; ids alone are only
//!   unique within one kind.
//! - Announcement items carry no tags, animal, or rating by construction.

pub mod activity;
pub mod record;
