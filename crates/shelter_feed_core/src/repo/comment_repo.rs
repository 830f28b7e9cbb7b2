//! Comment source reader.
//!
//! # Invariants
//! - Queries are scoped to comments on the group's non-deleted animals and to
//!   `is_deleted = 0`.
//! - Tag filtering is OR: a comment matches when it carries any requested tag.
//!   Tag names compare case-insensitively over ASCII letters, as SQLite
//!   `NOCASE` does.
//! - `rating=poor` means a stored rating of at most 2; unrated comments never
//!   match a rating filter.

use crate::feed::filter::{FeedFilter, RatingFilter, POOR_RATING_MAX};
use crate::model::activity::{AnimalRef, TagRef, UserRef};
use crate::model::record::{CommentRecord, GroupId, SourceSlice};
use crate::repo::{ensure_tables, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

const COMMENT_SELECT_SQL: &str = "SELECT
    c.id,
    c.content,
    c.image_url,
    c.session_rating,
    c.created_at,
    u.id AS author_id,
    u.name AS author_name,
    an.id AS animal_id,
    an.name AS animal_name,
    an.image_url AS animal_image_url
FROM comments c
INNER JOIN animals an ON an.id = c.animal_id
INNER JOIN users u ON u.id = c.user_id";

/// Read path for per-animal comments.
pub trait CommentReader {
    /// Returns the group's matching comments, newest first.
    fn read_comments(
        &self,
        group_id: GroupId,
        filter: &FeedFilter,
    ) -> RepoResult<SourceSlice<CommentRecord>>;
}

impl<T: CommentReader + ?Sized> CommentReader for &T {
    fn read_comments(
        &self,
        group_id: GroupId,
        filter: &FeedFilter,
    ) -> RepoResult<SourceSlice<CommentRecord>> {
        (**self).read_comments(group_id, filter)
    }
}

/// SQLite-backed comment reader.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Constructs a reader from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[
                (
                    "comments",
                    &[
                        "id",
                        "animal_id",
                        "user_id",
                        "session_rating",
                        "created_at",
                        "is_deleted",
                    ],
                ),
                ("animals", &["id", "group_id", "name", "is_deleted"]),
                ("users", &["id", "name"]),
                ("tags", &["id", "name", "color"]),
                ("comment_tags", &["comment_id", "tag_id"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl CommentReader for SqliteCommentRepository<'_> {
    fn read_comments(
        &self,
        group_id: GroupId,
        filter: &FeedFilter,
    ) -> RepoResult<SourceSlice<CommentRecord>> {
        if !filter.admits_comments() {
            return Ok(SourceSlice::empty());
        }

        let mut sql = format!(
            "{COMMENT_SELECT_SQL}
             WHERE an.group_id = ?
               AND an.is_deleted = 0
               AND c.is_deleted = 0"
        );
        let mut bind_values: Vec<Value> = vec![Value::Integer(group_id)];

        let window = filter.created_window();
        if let Some(start) = window.start_ms {
            sql.push_str(" AND c.created_at >= ?");
            bind_values.push(Value::Integer(start));
        }
        if let Some(end) = window.end_ms {
            sql.push_str(" AND c.created_at < ?");
            bind_values.push(Value::Integer(end));
        }

        if let Some(animal_id) = filter.animal_id {
            sql.push_str(" AND c.animal_id = ?");
            bind_values.push(Value::Integer(animal_id));
        }

        match filter.rating {
            Some(RatingFilter::Exactly(rating)) => {
                sql.push_str(" AND c.session_rating = ?");
                bind_values.push(Value::Integer(i64::from(rating)));
            }
            Some(RatingFilter::Poor) => {
                sql.push_str(" AND c.session_rating <= ?");
                bind_values.push(Value::Integer(i64::from(POOR_RATING_MAX)));
            }
            None => {}
        }

        if !filter.tags.is_empty() {
            let placeholders = vec!["?"; filter.tags.len()].join(", ");
            sql.push_str(&format!(
                " AND EXISTS (
                    SELECT 1
                    FROM comment_tags ct
                    INNER JOIN tags t ON t.id = ct.tag_id
                    WHERE ct.comment_id = c.id
                      AND t.name COLLATE NOCASE IN ({placeholders})
                )"
            ));
            bind_values.extend(filter.tags.iter().cloned().map(Value::Text));
        }

        sql.push_str(" ORDER BY c.created_at DESC, c.id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = parse_comment_row(row)?;
            record.tags = load_tags_for_comment(self.conn, record.id)?;
            records.push(record);
        }

        Ok(SourceSlice::complete(records))
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<CommentRecord> {
    let id: i64 = row.get("id")?;
    let session_rating = match row.get::<_, Option<i64>>("session_rating")? {
        Some(value @ 1..=5) => Some(value as u8),
        Some(other) => {
            return Err(RepoError::InvalidData(format!(
                "invalid session_rating `{other}` on comment {id}"
            )));
        }
        None => None,
    };

    Ok(CommentRecord {
        id,
        animal: AnimalRef {
            id: row.get("animal_id")?,
            name: row.get("animal_name")?,
            image_url: row.get("animal_image_url")?,
        },
        author: UserRef {
            id: row.get("author_id")?,
            name: row.get("author_name")?,
        },
        content: row.get("content")?,
        image_url: row.get("image_url")?,
        session_rating,
        tags: Vec::new(),
        created_at: row.get("created_at")?,
    })
}

fn load_tags_for_comment(conn: &Connection, comment_id: i64) -> RepoResult<Vec<TagRef>> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.name, t.color
         FROM comment_tags ct
         INNER JOIN tags t ON t.id = ct.tag_id
         WHERE ct.comment_id = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([comment_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        tags.push(TagRef {
            name: name.to_ascii_lowercase(),
            color: row.get(1)?,
        });
    }
    Ok(tags)
}
