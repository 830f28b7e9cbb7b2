//! Feed access decision seam.
//!
//! The engine trusts whatever `GroupAccess` answers and performs no further
//! checks. `SqliteGroupAccess` grants access to members of a live group.

use crate::model::record::{GroupId, UserId};
use crate::repo::{ensure_tables, RepoResult};
use rusqlite::{params, Connection};

/// Authorization collaborator for feed reads.
pub trait GroupAccess {
    /// Whether `caller_id` may read the activity feed of `group_id`.
    fn can_read_group_feed(&self, caller_id: UserId, group_id: GroupId) -> RepoResult<bool>;
}

impl<T: GroupAccess + ?Sized> GroupAccess for &T {
    fn can_read_group_feed(&self, caller_id: UserId, group_id: GroupId) -> RepoResult<bool> {
        (**self).can_read_group_feed(caller_id, group_id)
    }
}

/// Membership-based access check against the feed store.
pub struct SqliteGroupAccess<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGroupAccess<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[
                ("groups", &["id", "is_deleted"]),
                ("group_members", &["group_id", "user_id"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl GroupAccess for SqliteGroupAccess<'_> {
    fn can_read_group_feed(&self, caller_id: UserId, group_id: GroupId) -> RepoResult<bool> {
        let allowed: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM group_members gm
                INNER JOIN groups g ON g.id = gm.group_id
                WHERE gm.group_id = ?1
                  AND gm.user_id = ?2
                  AND g.is_deleted = 0
            );",
            params![group_id, caller_id],
            |row| row.get(0),
        )?;
        Ok(allowed == 1)
    }
}
