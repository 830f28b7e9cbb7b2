//! Announcement source reader.
//!
//! # Invariants
//! - Queries are scoped to one group and to `is_deleted = 0`.
//! - Only the `from`/`to` window applies; a filter with any comment-only
//!   attribute, or a type excluding announcements, yields an empty slice
//!   without touching storage.

use crate::feed::filter::FeedFilter;
use crate::model::activity::UserRef;
use crate::model::record::{AnnouncementRecord, GroupId, SourceSlice};
use crate::repo::{ensure_tables, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

const ANNOUNCEMENT_SELECT_SQL: &str = "SELECT
    a.id,
    a.group_id,
    a.content,
    a.image_url,
    a.created_at,
    u.id AS author_id,
    u.name AS author_name
FROM announcements a
INNER JOIN users u ON u.id = a.user_id";

/// Read path for group announcements.
pub trait AnnouncementReader {
    /// Returns the group's matching announcements, newest first.
    fn read_announcements(
        &self,
        group_id: GroupId,
        filter: &FeedFilter,
    ) -> RepoResult<SourceSlice<AnnouncementRecord>>;
}

impl<T: AnnouncementReader + ?Sized> AnnouncementReader for &T {
    fn read_announcements(
        &self,
        group_id: GroupId,
        filter: &FeedFilter,
    ) -> RepoResult<SourceSlice<AnnouncementRecord>> {
        (**self).read_announcements(group_id, filter)
    }
}

/// SQLite-backed announcement reader.
pub struct SqliteAnnouncementRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAnnouncementRepository<'conn> {
    /// Constructs a reader from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[
                (
                    "announcements",
                    &["id", "group_id", "user_id", "created_at", "is_deleted"],
                ),
                ("users", &["id", "name"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl AnnouncementReader for SqliteAnnouncementRepository<'_> {
    fn read_announcements(
        &self,
        group_id: GroupId,
        filter: &FeedFilter,
    ) -> RepoResult<SourceSlice<AnnouncementRecord>> {
        if !filter.admits_announcements() {
            return Ok(SourceSlice::empty());
        }

        let mut sql = format!(
            "{ANNOUNCEMENT_SELECT_SQL}
             WHERE a.group_id = ?
               AND a.is_deleted = 0"
        );
        let mut bind_values: Vec<Value> = vec![Value::Integer(group_id)];

        let window = filter.created_window();
        if let Some(start) = window.start_ms {
            sql.push_str(" AND a.created_at >= ?");
            bind_values.push(Value::Integer(start));
        }
        if let Some(end) = window.end_ms {
            sql.push_str(" AND a.created_at < ?");
            bind_values.push(Value::Integer(end));
        }

        sql.push_str(" ORDER BY a.created_at DESC, a.id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_announcement_row(row)?);
        }

        Ok(SourceSlice::complete(records))
    }
}

fn parse_announcement_row(row: &Row<'_>) -> RepoResult<AnnouncementRecord> {
    Ok(AnnouncementRecord {
        id: row.get("id")?,
        group_id: row.get("group_id")?,
        author: UserRef {
            id: row.get("author_id")?,
            name: row.get("author_name")?,
        },
        content: row.get("content")?,
        image_url: row.get("image_url")?,
        created_at: row.get("created_at")?,
    })
}
