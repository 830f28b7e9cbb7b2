//! Two-way merge and page extraction over time-sorted activity sequences.
//!
//! # Invariants
//! - Feed order is `created_at DESC`, then kind (announcements before
//!   comments), then `id DESC`. Equal inputs always produce equal output.
//! - Inputs must already be in feed order; the merge never re-sorts.
//!
//! The merge materializes every matching item before slicing the page, so it
//! costs O(total matches) per request. A keyset cursor per source feeding a
//! bounded merge of at most `offset + limit` items per side would bring that
//! down to O(page) if group feeds grow large.

use crate::model::activity::ActivityItem;
use std::cmp::Ordering;

/// Compares two items by feed position; `Less` means `left` is shown first.
pub fn feed_order(left: &ActivityItem, right: &ActivityItem) -> Ordering {
    right
        .created_at()
        .cmp(&left.created_at())
        .then_with(|| left.kind().cmp(&right.kind()))
        .then_with(|| right.id().cmp(&left.id()))
}

/// Interleaves two feed-ordered sequences into one feed-ordered sequence.
pub fn merge_by_recency(left: Vec<ActivityItem>, right: Vec<ActivityItem>) -> Vec<ActivityItem> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => feed_order(l, r) != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }

    merged
}

/// Extracts `[offset, offset + limit)` from a merged sequence.
///
/// Returns an empty page when `offset` is at or beyond the end.
pub fn paginate(merged: Vec<ActivityItem>, offset: u32, limit: u32) -> Vec<ActivityItem> {
    let offset = offset as usize;
    if offset >= merged.len() {
        return Vec::new();
    }
    merged
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .collect()
}
