//! Native record shapes returned by the source readers.

use super::activity::{AnimalRef, TagRef, UserRef};

/// Group identifier.
pub type GroupId = i64;
/// User identifier (authors and feed callers).
pub type UserId = i64;
/// Animal identifier.
pub type AnimalId = i64;

/// One group announcement row as stored upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementRecord {
    pub id: i64,
    pub group_id: GroupId,
    pub author: UserRef,
    pub content: String,
    pub image_url: Option<String>,
    /// Creation time in epoch milliseconds (UTC).
    pub created_at: i64,
}

/// One animal comment row as stored upstream, with its tag links resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: i64,
    pub animal: AnimalRef,
    pub author: UserRef,
    pub content: String,
    pub image_url: Option<String>,
    /// Session quality, validated to 1..=5 by the reader.
    pub session_rating: Option<u8>,
    /// Tags sorted by name, lowercase.
    pub tags: Vec<TagRef>,
    /// Creation time in epoch milliseconds (UTC).
    pub created_at: i64,
}

/// Sorted output of one source reader plus its matching count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSlice<T> {
    /// Records sorted by `created_at DESC, id DESC`.
    pub items: Vec<T>,
    /// Number of records matching the filter in this source.
    pub matching_count: usize,
}

impl<T> SourceSlice<T> {
    /// Wraps a complete, already-sorted result set.
    pub fn complete(items: Vec<T>) -> Self {
        let matching_count = items.len();
        Self {
            items,
            matching_count,
        }
    }

    /// Result for a source the filter rules out entirely.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            matching_count: 0,
        }
    }
}
