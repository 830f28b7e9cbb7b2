//! Page assembly and the feed's wire shape.
//!
//! # Invariants
//! - `items.len() <= limit` and `offset + items.len() <= total` whenever the
//!   offset is inside the result set.
//! - `has_more == (offset + items.len() < total)`.
//! - Announcement views always carry `tags: []`, `animal: null` and an empty
//!   `metadata` object.

use crate::feed::filter::FeedFilter;
use crate::model::activity::{ActivityItem, ActivityKind, AnimalRef, TagRef, UserRef};
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

/// One assembled feed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPage {
    pub items: Vec<ActivityItem>,
    /// Matching items across both sources.
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

impl FeedPage {
    /// Packages a page cut from a merged sequence of `total` items.
    pub fn assemble(items: Vec<ActivityItem>, total: u64, filter: &FeedFilter) -> Self {
        let seen = u64::from(filter.offset) + items.len() as u64;
        Self {
            has_more: seen < total,
            items,
            total,
            limit: filter.limit,
            offset: filter.offset,
        }
    }

    /// Converts the page into its serializable response body.
    pub fn to_body(&self) -> FeedResponseBody {
        FeedResponseBody {
            items: self.items.iter().map(ActivityItemView::from).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
            has_more: self.has_more,
        }
    }
}

/// JSON body of `GET /groups/{groupId}/activity-feed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedResponseBody {
    pub items: Vec<ActivityItemView>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

/// Wire projection of one activity item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItemView {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub id: i64,
    /// RFC 3339, UTC, millisecond precision.
    pub created_at: String,
    pub user: UserRef,
    pub content: String,
    pub image_url: Option<String>,
    pub tags: Vec<TagRef>,
    pub animal: Option<AnimalRef>,
    pub metadata: ItemMetadata,
}

/// Kind-specific extras. Serializes as `{}` when nothing applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_rating: Option<u8>,
}

impl From<&ActivityItem> for ActivityItemView {
    fn from(item: &ActivityItem) -> Self {
        Self {
            kind: item.kind(),
            id: item.id(),
            created_at: format_timestamp(item.created_at()),
            user: item.author().clone(),
            content: item.content().to_string(),
            image_url: item.image_url().map(str::to_string),
            tags: item.tags().to_vec(),
            animal: item.animal().cloned(),
            metadata: ItemMetadata {
                session_rating: item.rating(),
            },
        }
    }
}

/// Renders epoch milliseconds as RFC 3339 UTC.
///
/// Values outside chrono's range fall back to the raw millisecond count.
pub fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| epoch_ms.to_string())
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, FeedPage};
    use crate::feed::filter::FeedFilter;
    use crate::model::activity::{
        ActivityItem, AnimalRef, AnnouncementActivity, CommentActivity, TagRef, UserRef,
    };
    use serde_json::json;

    fn announcement() -> ActivityItem {
        ActivityItem::Announcement(AnnouncementActivity {
            id: 1,
            created_at: 0,
            author: UserRef {
                id: 10,
                name: "Ana".to_string(),
            },
            content: "Adoption day".to_string(),
            image_url: None,
        })
    }

    fn comment() -> ActivityItem {
        ActivityItem::Comment(CommentActivity {
            id: 1,
            created_at: 1_500,
            author: UserRef {
                id: 11,
                name: "Ben".to_string(),
            },
            content: "Good recall today".to_string(),
            image_url: Some("https://cdn.example/c.jpg".to_string()),
            animal: AnimalRef {
                id: 3,
                name: "Juno".to_string(),
                image_url: None,
            },
            tags: vec![TagRef {
                name: "training".to_string(),
                color: "#4caf50".to_string(),
            }],
            rating: Some(4),
        })
    }

    #[test]
    fn has_more_reflects_remaining_items() {
        let filter = FeedFilter {
            limit: 1,
            ..FeedFilter::default()
        };
        let page = FeedPage::assemble(vec![comment()], 2, &filter);
        assert!(page.has_more);

        let last = FeedFilter {
            limit: 1,
            offset: 1,
            ..FeedFilter::default()
        };
        let page = FeedPage::assemble(vec![announcement()], 2, &last);
        assert!(!page.has_more);
    }

    #[test]
    fn overrun_page_keeps_total_and_reports_no_more() {
        let filter = FeedFilter {
            offset: 40,
            ..FeedFilter::default()
        };
        let page = FeedPage::assemble(Vec::new(), 5, &filter);
        assert_eq!(page.total, 5);
        assert!(!page.has_more);
    }

    #[test]
    fn body_serializes_wire_shape_for_both_kinds() {
        let page = FeedPage::assemble(vec![comment(), announcement()], 2, &FeedFilter::default());
        let value = serde_json::to_value(page.to_body()).unwrap();

        assert_eq!(value["hasMore"], json!(false));
        assert_eq!(value["limit"], json!(20));

        let comment = &value["items"][0];
        assert_eq!(comment["type"], json!("comment"));
        assert_eq!(comment["created_at"], json!("1970-01-01T00:00:01.500Z"));
        assert_eq!(comment["user"], json!({"id": 11, "name": "Ben"}));
        assert_eq!(comment["metadata"], json!({"session_rating": 4}));
        assert_eq!(comment["animal"]["name"], json!("Juno"));
        assert_eq!(comment["tags"][0]["color"], json!("#4caf50"));

        let announcement = &value["items"][1];
        assert_eq!(announcement["type"], json!("announcement"));
        assert_eq!(announcement["tags"], json!([]));
        assert_eq!(announcement["animal"], json!(null));
        assert_eq!(announcement["metadata"], json!({}));
        assert_eq!(announcement["image_url"], json!(null));
    }

    #[test]
    fn timestamps_render_as_utc_rfc3339() {
        assert_eq!(format_timestamp(86_400_000), "1970-01-02T00:00:00.000Z");
    }
}
