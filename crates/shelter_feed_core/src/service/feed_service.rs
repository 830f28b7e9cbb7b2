//! Activity feed use-case service.
//!
//! # Responsibility
//! - Run one feed request end to end: access check, filter parsing, both
//!   source reads, normalization, merge, page assembly.
//! - Emit one structured log event per request.
//!
//! # Invariants
//! - A denied caller triggers no source reads.
//! - A rejected filter triggers no source reads.
//! - If either source read fails the whole request fails; a page is never
//!   built from one source alone.
//! - The service holds no state between requests.

use crate::feed::filter::{parse_filter, FeedFilter, FilterError, RawFeedParams};
use crate::feed::merge::{merge_by_recency, paginate};
use crate::feed::normalize::normalize_all;
use crate::feed::response::FeedPage;
use crate::model::record::{GroupId, UserId};
use crate::repo::access_repo::{GroupAccess, SqliteGroupAccess};
use crate::repo::announcement_repo::{AnnouncementReader, SqliteAnnouncementRepository};
use crate::repo::comment_repo::{CommentReader, SqliteCommentRepository};
use crate::repo::{RepoError, RepoResult};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for feed requests.
#[derive(Debug)]
pub enum FeedServiceError {
    /// The access collaborator refused the caller.
    PermissionDenied { caller_id: UserId, group_id: GroupId },
    /// A filter parameter is malformed.
    Validation(FilterError),
    /// A source read or the access lookup failed.
    Repo(RepoError),
}

impl FeedServiceError {
    /// Stable machine-readable code for API bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "forbidden",
            Self::Validation(_) => "invalid_filter",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for FeedServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied {
                caller_id,
                group_id,
            } => write!(
                f,
                "user {caller_id} may not read the activity feed of group {group_id}"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FeedServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PermissionDenied { .. } => None,
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<FilterError> for FeedServiceError {
    fn from(value: FilterError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for FeedServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Feed service facade over the two source readers and the access seam.
pub struct FeedService<A, C, G> {
    announcements: A,
    comments: C,
    access: G,
}

/// Feed service wired to one SQLite connection.
pub type SqliteFeedService<'conn> = FeedService<
    SqliteAnnouncementRepository<'conn>,
    SqliteCommentRepository<'conn>,
    SqliteGroupAccess<'conn>,
>;

impl<'conn> SqliteFeedService<'conn> {
    /// Builds every reader over the same migrated connection.
    pub fn try_from_conn(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(FeedService::new(
            SqliteAnnouncementRepository::try_new(conn)?,
            SqliteCommentRepository::try_new(conn)?,
            SqliteGroupAccess::try_new(conn)?,
        ))
    }
}

impl<A, C, G> FeedService<A, C, G>
where
    A: AnnouncementReader,
    C: CommentReader,
    G: GroupAccess,
{
    /// Creates a service from reader and access implementations.
    pub fn new(announcements: A, comments: C, access: G) -> Self {
        Self {
            announcements,
            comments,
            access,
        }
    }

    /// Returns one page of the group's merged activity timeline.
    ///
    /// # Errors
    /// - `PermissionDenied` when the access seam refuses the caller.
    /// - `Validation` naming the first malformed parameter.
    /// - `Repo` when the access lookup or either source read fails.
    pub fn activity_feed(
        &self,
        caller_id: UserId,
        group_id: GroupId,
        raw: &RawFeedParams,
    ) -> Result<FeedPage, FeedServiceError> {
        self.respond(caller_id, group_id, || parse_filter(raw))
    }

    /// Same as `activity_feed`, decoding a raw URL query string first.
    ///
    /// The access check still runs before the query is decoded.
    pub fn activity_feed_query(
        &self,
        caller_id: UserId,
        group_id: GroupId,
        query: &str,
    ) -> Result<FeedPage, FeedServiceError> {
        self.respond(caller_id, group_id, || {
            RawFeedParams::from_query(query).and_then(|raw| parse_filter(&raw))
        })
    }

    fn respond<F>(
        &self,
        caller_id: UserId,
        group_id: GroupId,
        parse: F,
    ) -> Result<FeedPage, FeedServiceError>
    where
        F: FnOnce() -> Result<FeedFilter, FilterError>,
    {
        let started_at = Instant::now();
        let result = self.build_page(caller_id, group_id, parse);
        let duration_ms = started_at.elapsed().as_millis();

        match &result {
            Ok(page) => info!(
                "event=activity_feed module=feed status=ok group_id={group_id} caller_id={caller_id} returned={} total={} offset={} limit={} duration_ms={duration_ms}",
                page.items.len(),
                page.total,
                page.offset,
                page.limit
            ),
            Err(FeedServiceError::Repo(err)) => error!(
                "event=activity_feed module=feed status=error group_id={group_id} caller_id={caller_id} error_code=storage_error duration_ms={duration_ms} error={err}"
            ),
            Err(err @ FeedServiceError::Validation(filter_err)) => warn!(
                "event=activity_feed module=feed status=rejected group_id={group_id} caller_id={caller_id} error_code={} field={} duration_ms={duration_ms}",
                err.code(),
                filter_err.field()
            ),
            Err(err) => warn!(
                "event=activity_feed module=feed status=rejected group_id={group_id} caller_id={caller_id} error_code={} duration_ms={duration_ms}",
                err.code()
            ),
        }

        result
    }

    fn build_page<F>(
        &self,
        caller_id: UserId,
        group_id: GroupId,
        parse: F,
    ) -> Result<FeedPage, FeedServiceError>
    where
        F: FnOnce() -> Result<FeedFilter, FilterError>,
    {
        if !self.access.can_read_group_feed(caller_id, group_id)? {
            return Err(FeedServiceError::PermissionDenied {
                caller_id,
                group_id,
            });
        }

        let filter = parse()?;
        self.read_and_merge(group_id, &filter)
    }

    fn read_and_merge(
        &self,
        group_id: GroupId,
        filter: &FeedFilter,
    ) -> Result<FeedPage, FeedServiceError> {
        let announcements = self.announcements.read_announcements(group_id, filter)?;
        let comments = self.comments.read_comments(group_id, filter)?;

        let total = (announcements.matching_count + comments.matching_count) as u64;
        let merged = merge_by_recency(
            normalize_all(announcements.items),
            normalize_all(comments.items),
        );
        let items = paginate(merged, filter.offset, filter.limit);

        Ok(FeedPage::assemble(items, total, filter))
    }
}
