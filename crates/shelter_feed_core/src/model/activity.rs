//! Uniform activity item shared by every feed source.
//!
//! # Responsibility
//! - Model the feed entry as a discriminated union over its two sources.
//! - Expose the common projection (`kind`, `id`, `created_at`) the merge
//!   step orders by.
//!
//! # Invariants
//! - Comment-only attributes (tags, animal, rating) exist only on the
//!   `Comment` variant, so announcements cannot carry them.
//! - Items are read-only snapshots; nothing here writes back upstream.

use serde::{Deserialize, Serialize};

/// Source family of an activity item.
///
/// Declaration order is the tie-break order for items sharing a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Group-level announcement.
    Announcement,
    /// Per-animal volunteer comment.
    Comment,
}

/// Author reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub name: String,
}

/// Tag with its display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub name: String,
    pub color: String,
}

/// Animal a comment was written about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalRef {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
}

/// Announcement payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementActivity {
    pub id: i64,
    pub created_at: i64,
    pub author: UserRef,
    pub content: String,
    pub image_url: Option<String>,
}

/// Comment payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentActivity {
    pub id: i64,
    pub created_at: i64,
    pub author: UserRef,
    pub content: String,
    pub image_url: Option<String>,
    pub animal: AnimalRef,
    pub tags: Vec<TagRef>,
    pub rating: Option<u8>,
}

/// One entry of the merged group timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityItem {
    Announcement(AnnouncementActivity),
    Comment(CommentActivity),
}

impl ActivityItem {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Self::Announcement(_) => ActivityKind::Announcement,
            Self::Comment(_) => ActivityKind::Comment,
        }
    }

    /// Id within this item's kind.
    pub fn id(&self) -> i64 {
        match self {
            Self::Announcement(item) => item.id,
            Self::Comment(item) => item.id,
        }
    }

    /// Creation time in epoch milliseconds (UTC); the feed's sort key.
    pub fn created_at(&self) -> i64 {
        match self {
            Self::Announcement(item) => item.created_at,
            Self::Comment(item) => item.created_at,
        }
    }

    pub fn author(&self) -> &UserRef {
        match self {
            Self::Announcement(item) => &item.author,
            Self::Comment(item) => &item.author,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Announcement(item) => &item.content,
            Self::Comment(item) => &item.content,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::Announcement(item) => item.image_url.as_deref(),
            Self::Comment(item) => item.image_url.as_deref(),
        }
    }

    /// Tags; always empty for announcements.
    pub fn tags(&self) -> &[TagRef] {
        match self {
            Self::Announcement(_) => &[],
            Self::Comment(item) => &item.tags,
        }
    }

    /// Animal; always `None` for announcements.
    pub fn animal(&self) -> Option<&AnimalRef> {
        match self {
            Self::Announcement(_) => None,
            Self::Comment(item) => Some(&item.animal),
        }
    }

    /// Session rating; always `None` for announcements.
    pub fn rating(&self) -> Option<u8> {
        match self {
            Self::Announcement(_) => None,
            Self::Comment(item) => item.rating,
        }
    }
}
