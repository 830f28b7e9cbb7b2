//! Group activity feed engine for the shelter volunteer app.
//!
//! Merges group announcements and per-animal comments into one
//! chronologically ordered, filterable, paginated timeline. This crate is the
//! single source of truth for the feed's invariants.

pub mod db;
pub mod feed;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use feed::filter::{
    parse_filter, FeedFilter, FeedType, FilterError, RatingFilter, RawFeedParams,
    FEED_DEFAULT_LIMIT, FEED_LIMIT_MAX,
};
pub use feed::merge::{merge_by_recency, paginate};
pub use feed::response::{ActivityItemView, FeedPage, FeedResponseBody};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{ActivityItem, ActivityKind, AnimalRef, TagRef, UserRef};
pub use model::record::{
    AnimalId, AnnouncementRecord, CommentRecord, GroupId, SourceSlice, UserId,
};
pub use repo::access_repo::{GroupAccess, SqliteGroupAccess};
pub use repo::announcement_repo::{AnnouncementReader, SqliteAnnouncementRepository};
pub use repo::comment_repo::{CommentReader, SqliteCommentRepository};
pub use repo::{RepoError, RepoResult};
pub use service::feed_service::{FeedService, FeedServiceError, SqliteFeedService};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
