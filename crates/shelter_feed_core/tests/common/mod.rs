//! Shared SQL fixtures for feed integration tests.
#![allow(dead_code)]

use rusqlite::{params, Connection};
use shelter_feed_core::db::open_db_in_memory;

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;
/// 2024-01-01T00:00:00Z
pub const BASE_MS: i64 = 1_704_067_200_000;

pub const GROUP: i64 = 1;
pub const OTHER_GROUP: i64 = 2;

pub const COORDINATOR: i64 = 1;
pub const VOLUNTEER: i64 = 2;
pub const OUTSIDER: i64 = 3;

pub const PEPPER: i64 = 10;
pub const BISCUIT: i64 = 11;
pub const STRAY: i64 = 20;

/// Timestamp `days` (fractional) after `BASE_MS`.
pub fn day(days: f64) -> i64 {
    BASE_MS + (days * DAY_MS as f64) as i64
}

/// Migrated in-memory store with two groups, their members and animals.
pub fn seeded_store() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (id, name) VALUES
            (1, 'Coordinator Cleo'),
            (2, 'Volunteer Vik'),
            (3, 'Outsider Oli');
         INSERT INTO groups (id, name) VALUES
            (1, 'Dog walkers'),
            (2, 'Cat socializers');
         INSERT INTO group_members (group_id, user_id, role) VALUES
            (1, 1, 'coordinator'),
            (1, 2, 'member'),
            (2, 3, 'member');
         INSERT INTO animals (id, group_id, name, image_url) VALUES
            (10, 1, 'Pepper', 'https://cdn.example/pepper.jpg'),
            (11, 1, 'Biscuit', NULL),
            (20, 2, 'Stray', NULL);",
    )
    .unwrap();
    conn
}

pub fn insert_announcement(conn: &Connection, id: i64, group_id: i64, created_at: i64) {
    conn.execute(
        "INSERT INTO announcements (id, group_id, user_id, content, image_url, created_at)
         VALUES (?1, ?2, ?3, ?4, NULL, ?5);",
        params![id, group_id, COORDINATOR, format!("announcement {id}"), created_at],
    )
    .unwrap();
}

pub fn insert_comment(
    conn: &Connection,
    id: i64,
    animal_id: i64,
    created_at: i64,
    rating: Option<i64>,
    tags: &[&str],
) {
    conn.execute(
        "INSERT INTO comments (id, animal_id, user_id, content, image_url, session_rating, created_at)
         VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6);",
        params![id, animal_id, VOLUNTEER, format!("comment {id}"), rating, created_at],
    )
    .unwrap();
    for tag in tags {
        conn.execute(
            "INSERT OR IGNORE INTO tags (name, color) VALUES (?1, '#607d8b');",
            [*tag],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO comment_tags (comment_id, tag_id)
             SELECT ?1, id FROM tags WHERE name = ?2 COLLATE NOCASE;",
            params![id, *tag],
        )
        .unwrap();
    }
}

pub fn soft_delete(conn: &Connection, table: &str, id: i64) {
    conn.execute(
        &format!("UPDATE {table} SET is_deleted = 1 WHERE id = ?1;"),
        [id],
    )
    .unwrap();
}

/// Three announcements on days 1, 2, 3 and two comments on days 1.5, 2.5.
pub fn five_item_timeline(conn: &Connection) {
    insert_announcement(conn, 1, GROUP, day(1.0));
    insert_announcement(conn, 2, GROUP, day(2.0));
    insert_announcement(conn, 3, GROUP, day(3.0));
    insert_comment(conn, 1, PEPPER, day(1.5), None, &[]);
    insert_comment(conn, 2, BISCUIT, day(2.5), None, &[]);
}
