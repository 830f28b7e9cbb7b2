mod common;

use common::*;
use serde_json::json;
use shelter_feed_core::{
    ActivityKind, FeedPage, FeedServiceError, SqliteFeedService, FEED_DEFAULT_LIMIT, FEED_LIMIT_MAX,
};

fn feed(conn: &rusqlite::Connection, query: &str) -> FeedPage {
    let service = SqliteFeedService::try_from_conn(conn).unwrap();
    service
        .activity_feed_query(VOLUNTEER, GROUP, query)
        .unwrap()
}

fn keys(page: &FeedPage) -> Vec<(ActivityKind, i64)> {
    page.items.iter().map(|item| (item.kind(), item.id())).collect()
}

#[test]
fn first_page_merges_both_sources_newest_first() {
    let conn = seeded_store();
    five_item_timeline(&conn);

    let page = feed(&conn, "limit=3&offset=0");
    assert_eq!(
        keys(&page),
        vec![
            (ActivityKind::Announcement, 3),
            (ActivityKind::Comment, 2),
            (ActivityKind::Announcement, 2),
        ]
    );
    assert_eq!(page.total, 5);
    assert!(page.has_more);
}

#[test]
fn second_page_returns_remaining_items() {
    let conn = seeded_store();
    five_item_timeline(&conn);

    let page = feed(&conn, "limit=3&offset=3");
    assert_eq!(
        keys(&page),
        vec![
            (ActivityKind::Comment, 1),
            (ActivityKind::Announcement, 1),
        ]
    );
    assert_eq!(page.total, 5);
    assert!(!page.has_more);
}

#[test]
fn defaults_apply_without_query() {
    let conn = seeded_store();
    five_item_timeline(&conn);

    let page = feed(&conn, "");
    assert_eq!(page.limit, FEED_DEFAULT_LIMIT);
    assert_eq!(page.offset, 0);
    assert_eq!(page.items.len(), 5);
    assert!(!page.has_more);
}

#[test]
fn offset_overrun_returns_empty_page_with_total() {
    let conn = seeded_store();
    five_item_timeline(&conn);

    for offset in [5, 6, 500] {
        let page = feed(&conn, &format!("offset={offset}&limit=3"));
        assert!(page.items.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.total, 5);
    }
}

#[test]
fn poor_rating_keeps_only_low_rated_comments() {
    let conn = seeded_store();
    insert_comment(&conn, 1, PEPPER, day(1.0), Some(1), &[]);
    insert_comment(&conn, 2, PEPPER, day(2.0), Some(3), &[]);
    insert_comment(&conn, 3, PEPPER, day(3.0), Some(5), &[]);
    insert_comment(&conn, 4, PEPPER, day(4.0), None, &[]);

    let page = feed(&conn, "type=comments&rating=poor");
    assert_eq!(keys(&page), vec![(ActivityKind::Comment, 1)]);
    assert_eq!(page.total, 1);

    let exact = feed(&conn, "rating=3");
    assert_eq!(keys(&exact), vec![(ActivityKind::Comment, 2)]);
}

#[test]
fn tag_filter_matches_any_requested_tag() {
    let conn = seeded_store();
    insert_comment(&conn, 1, PEPPER, day(1.0), None, &["behavior"]);
    insert_comment(&conn, 2, PEPPER, day(2.0), None, &["medical"]);
    insert_comment(&conn, 3, BISCUIT, day(3.0), None, &["behavior", "medical"]);
    insert_comment(&conn, 4, BISCUIT, day(4.0), None, &[]);

    let page = feed(&conn, "tags=behavior,medical");
    assert_eq!(
        keys(&page),
        vec![
            (ActivityKind::Comment, 3),
            (ActivityKind::Comment, 2),
            (ActivityKind::Comment, 1),
        ]
    );
    assert_eq!(page.total, 3);

    let both_tags = page.items[0].tags();
    assert_eq!(
        both_tags.iter().map(|tag| tag.name.as_str()).collect::<Vec<_>>(),
        vec!["behavior", "medical"]
    );
}

#[test]
fn tag_filter_is_case_insensitive() {
    let conn = seeded_store();
    insert_comment(&conn, 1, PEPPER, day(1.0), None, &["Medical"]);

    let page = feed(&conn, "tags=MEDICAL");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].tags()[0].name, "medical");
}

#[test]
fn non_ascii_tag_matches_its_exact_spelling() {
    let conn = seeded_store();
    insert_comment(&conn, 1, PEPPER, day(1.0), None, &["Ärger"]);
    insert_comment(&conn, 2, BISCUIT, day(2.0), None, &["ärger"]);

    let page = feed(&conn, "tags=%C3%84rger");
    assert_eq!(page.total, 1);
    assert_eq!(keys(&page), vec![(ActivityKind::Comment, 1)]);
    assert_eq!(page.items[0].tags()[0].name, "Ärger");

    let folded = feed(&conn, "tags=%C3%84RGER");
    assert_eq!(keys(&folded), vec![(ActivityKind::Comment, 1)]);
}

#[test]
fn oversized_limit_is_clamped_to_maximum() {
    let conn = seeded_store();
    five_item_timeline(&conn);

    let page = feed(&conn, "limit=99999999999999999999");
    assert_eq!(page.limit, FEED_LIMIT_MAX);
    assert_eq!(page.items.len(), 5);
}

#[test]
fn comment_only_attributes_exclude_every_announcement() {
    let conn = seeded_store();
    five_item_timeline(&conn);
    insert_comment(&conn, 3, PEPPER, day(4.0), Some(4), &["behavior"]);

    for query in [
        "type=announcements&tags=behavior",
        "type=announcements&animal=10",
        "type=announcements&rating=4",
        "type=announcements&rating=poor",
    ] {
        let page = feed(&conn, query);
        assert!(page.items.is_empty(), "{query}");
        assert_eq!(page.total, 0, "{query}");
        assert!(!page.has_more, "{query}");
    }

    let mixed = feed(&conn, "type=all&tags=behavior");
    assert_eq!(keys(&mixed), vec![(ActivityKind::Comment, 3)]);
}

#[test]
fn type_filter_selects_one_source() {
    let conn = seeded_store();
    five_item_timeline(&conn);

    let announcements = feed(&conn, "type=announcements");
    assert_eq!(announcements.total, 3);
    assert!(announcements
        .items
        .iter()
        .all(|item| item.kind() == ActivityKind::Announcement));

    let comments = feed(&conn, "type=comments");
    assert_eq!(comments.total, 2);
    assert!(comments
        .items
        .iter()
        .all(|item| item.kind() == ActivityKind::Comment));
}

#[test]
fn animal_filter_is_exact() {
    let conn = seeded_store();
    five_item_timeline(&conn);

    let page = feed(&conn, "animal=11");
    assert_eq!(keys(&page), vec![(ActivityKind::Comment, 2)]);
    assert_eq!(page.items[0].animal().map(|animal| animal.name.as_str()), Some("Biscuit"));
}

#[test]
fn date_bounds_are_inclusive_days() {
    let conn = seeded_store();
    five_item_timeline(&conn);

    // Day 2 covers announcement 2 (00:00) and comment 2 (12:00).
    let page = feed(&conn, "from=2024-01-03&to=2024-01-03");
    assert_eq!(
        keys(&page),
        vec![
            (ActivityKind::Comment, 2),
            (ActivityKind::Announcement, 2),
        ]
    );

    let open_ended = feed(&conn, "from=2024-01-04");
    assert_eq!(keys(&open_ended), vec![(ActivityKind::Announcement, 3)]);
}

#[test]
fn soft_deleted_rows_never_appear() {
    let conn = seeded_store();
    five_item_timeline(&conn);
    insert_comment(&conn, 3, BISCUIT, day(3.5), None, &[]);
    soft_delete(&conn, "announcements", 3);
    soft_delete(&conn, "comments", 1);
    soft_delete(&conn, "animals", BISCUIT);

    let page = feed(&conn, "");
    assert_eq!(
        keys(&page),
        vec![
            (ActivityKind::Announcement, 2),
            (ActivityKind::Announcement, 1),
        ]
    );
    assert_eq!(page.total, 2);
}

#[test]
fn feed_is_scoped_to_one_group() {
    let conn = seeded_store();
    five_item_timeline(&conn);
    insert_announcement(&conn, 99, OTHER_GROUP, day(5.0));
    insert_comment(&conn, 99, STRAY, day(5.0), Some(1), &["behavior"]);

    let page = feed(&conn, "");
    assert_eq!(page.total, 5);
    assert!(page.items.iter().all(|item| item.id() != 99));
}

#[test]
fn equal_timestamps_order_deterministically() {
    let conn = seeded_store();
    let at = day(1.0);
    insert_announcement(&conn, 1, GROUP, at);
    insert_announcement(&conn, 2, GROUP, at);
    insert_comment(&conn, 1, PEPPER, at, None, &[]);
    insert_comment(&conn, 2, BISCUIT, at, None, &[]);

    let expected = vec![
        (ActivityKind::Announcement, 2),
        (ActivityKind::Announcement, 1),
        (ActivityKind::Comment, 2),
        (ActivityKind::Comment, 1),
    ];
    for _ in 0..3 {
        assert_eq!(keys(&feed(&conn, "")), expected);
    }

    let boundary = feed(&conn, "limit=3&offset=2");
    assert_eq!(keys(&boundary), expected[2..].to_vec());
}

#[test]
fn walking_all_pages_reproduces_full_feed() {
    let conn = seeded_store();
    for id in 1..=7 {
        insert_announcement(&conn, id, GROUP, day(id as f64));
    }
    for id in 1..=6 {
        insert_comment(&conn, id, PEPPER, day(id as f64 + 0.25), Some(id % 5 + 1), &[]);
    }

    let full = keys(&feed(&conn, "limit=100"));
    assert_eq!(full.len(), 13);

    let mut walked = Vec::new();
    let mut offset = 0;
    loop {
        let page = feed(&conn, &format!("limit=4&offset={offset}"));
        assert!(page.items.len() <= 4);
        assert!(u64::from(page.offset) + page.items.len() as u64 <= page.total);
        assert_eq!(
            page.has_more,
            u64::from(page.offset) + (page.items.len() as u64) < page.total
        );
        assert!(page
            .items
            .windows(2)
            .all(|pair| pair[0].created_at() >= pair[1].created_at()));
        walked.extend(keys(&page));
        if !page.has_more {
            break;
        }
        offset += 4;
    }
    assert_eq!(walked, full);
}

#[test]
fn announcements_serialize_without_comment_attributes() {
    let conn = seeded_store();
    five_item_timeline(&conn);
    insert_comment(&conn, 3, PEPPER, day(0.5), Some(2), &["medical"]);

    let body = serde_json::to_value(feed(&conn, "").to_body()).unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 6);
    for item in items {
        if item["type"] == json!("announcement") {
            assert_eq!(item["tags"], json!([]));
            assert_eq!(item["animal"], json!(null));
            assert_eq!(item["metadata"], json!({}));
        } else {
            assert!(item["animal"]["id"].is_i64());
        }
    }

    let rated = items.last().unwrap();
    assert_eq!(rated["type"], json!("comment"));
    assert_eq!(rated["metadata"], json!({"session_rating": 2}));
    assert_eq!(rated["animal"]["image_url"], json!("https://cdn.example/pepper.jpg"));
    assert_eq!(rated["user"]["name"], json!("Volunteer Vik"));
    assert_eq!(body["total"], json!(6));
    assert_eq!(body["hasMore"], json!(false));
}

#[test]
fn non_member_is_denied() {
    let conn = seeded_store();
    five_item_timeline(&conn);
    let service = SqliteFeedService::try_from_conn(&conn).unwrap();

    let err = service
        .activity_feed_query(OUTSIDER, GROUP, "")
        .unwrap_err();
    assert!(matches!(
        err,
        FeedServiceError::PermissionDenied {
            caller_id: OUTSIDER,
            group_id: GROUP
        }
    ));
    assert_eq!(err.code(), "forbidden");
}

#[test]
fn deleted_group_denies_members() {
    let conn = seeded_store();
    soft_delete(&conn, "groups", GROUP);
    let service = SqliteFeedService::try_from_conn(&conn).unwrap();

    let err = service
        .activity_feed_query(COORDINATOR, GROUP, "")
        .unwrap_err();
    assert!(matches!(err, FeedServiceError::PermissionDenied { .. }));
}

#[test]
fn malformed_filter_names_field() {
    let conn = seeded_store();
    let service = SqliteFeedService::try_from_conn(&conn).unwrap();

    for (query, field) in [
        ("offset=-1", "offset"),
        ("rating=excellent", "rating"),
        ("from=2024-02-10&to=2024-02-01", "from"),
        ("animal=abc", "animal"),
    ] {
        match service.activity_feed_query(VOLUNTEER, GROUP, query) {
            Err(FeedServiceError::Validation(err)) => assert_eq!(err.field(), field, "{query}"),
            other => panic!("expected validation error for {query}, got {other:?}"),
        }
    }
}

#[test]
fn storage_failure_mid_request_fails_whole_feed() {
    let conn = seeded_store();
    five_item_timeline(&conn);
    let service = SqliteFeedService::try_from_conn(&conn).unwrap();
    conn.execute_batch("DROP TABLE comment_tags;").unwrap();

    let err = service.activity_feed_query(VOLUNTEER, GROUP, "").unwrap_err();
    assert!(matches!(err, FeedServiceError::Repo(_)));
    assert_eq!(err.code(), "storage_error");
}
