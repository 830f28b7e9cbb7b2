//! Record-to-activity mapping.
//!
//! Pure field mapping with no filtering. This is the seam that gives both
//! sources one shape before they are merged.

use crate::model::activity::{ActivityItem, AnnouncementActivity, CommentActivity};
use crate::model::record::{AnnouncementRecord, CommentRecord};

impl From<AnnouncementRecord> for ActivityItem {
    fn from(record: AnnouncementRecord) -> Self {
        Self::Announcement(AnnouncementActivity {
            id: record.id,
            created_at: record.created_at,
            author: record.author,
            content: record.content,
            image_url: record.image_url,
        })
    }
}

impl From<CommentRecord> for ActivityItem {
    fn from(record: CommentRecord) -> Self {
        Self::Comment(CommentActivity {
            id: record.id,
            created_at: record.created_at,
            author: record.author,
            content: record.content,
            image_url: record.image_url,
            animal: record.animal,
            tags: record.tags,
            rating: record.session_rating,
        })
    }
}

/// Normalizes one reader's sorted output, keeping its order.
pub fn normalize_all<R>(records: Vec<R>) -> Vec<ActivityItem>
where
    R: Into<ActivityItem>,
{
    records.into_iter().map(Into::into).collect()
}
