//! Endpoint API for the group activity feed.
//!
//! # Responsibility
//! - Serve `GET /groups/{groupId}/activity-feed` as a status + JSON body.
//! - Map feed service errors onto stable HTTP statuses and error codes.
//!
//! # Invariants
//! - Exported functions never panic; every failure becomes a response.
//! - Bodies are UTF-8 JSON with a stable shape.
//! - The caller id is supplied by the authentication layer and trusted.

use log::error;
use rusqlite::Connection;
use serde::Serialize;
use shelter_feed_core::db::open_db;
use shelter_feed_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    FeedServiceError, GroupId, SqliteFeedService, UserId,
};
use std::path::PathBuf;
use std::sync::OnceLock;

const FEED_DB_FILE_NAME: &str = "shelter_feed.sqlite3";
const FEED_DB_PATH_ENV: &str = "SHELTER_FEED_DB_PATH";
static FEED_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

pub const STATUS_OK: u16 = 200;
pub const STATUS_FORBIDDEN: u16 = 403;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Health-check probe. Never fails.
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version. Never fails.
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the same `level + log_dir` is idempotent.
pub fn init_logging(level: &str, log_dir: &str) -> String {
    match init_logging_inner(level, log_dir) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Status code plus JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, body },
            Err(err) => {
                error!(
                    "event=feed_response module=api status=error error_code=serialize_failed error={err}"
                );
                Self {
                    status: STATUS_INTERNAL_ERROR,
                    body: r#"{"error":{"code":"internal","message":"response serialization failed"}}"#
                        .to_string(),
                }
            }
        }
    }

    fn error(status: u16, code: &'static str, message: String, field: Option<&'static str>) -> Self {
        Self::json(
            status,
            &ErrorBody {
                error: ErrorDetail {
                    code,
                    message,
                    field,
                },
            },
        )
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

/// Dispatches a GET request against the configured feed store.
///
/// `path_and_query` is e.g. `/groups/4/activity-feed?limit=20&type=comments`.
pub fn handle_get(caller_id: UserId, path_and_query: &str) -> ApiResponse {
    let Some(group_id) = route_group_id(path_and_query) else {
        return not_found(path_and_query);
    };
    activity_feed(caller_id, group_id, query_part(path_and_query))
}

/// Serves one activity feed page from the configured feed store.
pub fn activity_feed(caller_id: UserId, group_id: GroupId, query: &str) -> ApiResponse {
    let db_path = resolve_feed_db_path();
    match open_db(&db_path) {
        Ok(conn) => activity_feed_with_conn(&conn, caller_id, group_id, query),
        Err(err) => ApiResponse::error(
            STATUS_INTERNAL_ERROR,
            "storage_error",
            format!("feed store unavailable: {err}"),
            None,
        ),
    }
}

/// Dispatches a GET request against an already-open feed store.
pub fn handle_get_with_conn(
    conn: &Connection,
    caller_id: UserId,
    path_and_query: &str,
) -> ApiResponse {
    match route_group_id(path_and_query) {
        Some(group_id) => {
            activity_feed_with_conn(conn, caller_id, group_id, query_part(path_and_query))
        }
        None => not_found(path_and_query),
    }
}

/// Serves one activity feed page from an already-open feed store.
pub fn activity_feed_with_conn(
    conn: &Connection,
    caller_id: UserId,
    group_id: GroupId,
    query: &str,
) -> ApiResponse {
    let service = match SqliteFeedService::try_from_conn(conn) {
        Ok(service) => service,
        Err(err) => {
            return ApiResponse::error(
                STATUS_INTERNAL_ERROR,
                "storage_error",
                format!("feed store unavailable: {err}"),
                None,
            );
        }
    };

    match service.activity_feed_query(caller_id, group_id, query) {
        Ok(page) => ApiResponse::json(STATUS_OK, &page.to_body()),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &FeedServiceError) -> ApiResponse {
    match err {
        FeedServiceError::PermissionDenied { .. } => {
            ApiResponse::error(STATUS_FORBIDDEN, err.code(), err.to_string(), None)
        }
        FeedServiceError::Validation(filter_err) => ApiResponse::error(
            STATUS_UNPROCESSABLE,
            err.code(),
            err.to_string(),
            Some(filter_err.field()),
        ),
        // Storage details stay in the logs.
        FeedServiceError::Repo(_) => ApiResponse::error(
            STATUS_INTERNAL_ERROR,
            err.code(),
            "activity feed could not be read".to_string(),
            None,
        ),
    }
}

fn not_found(path_and_query: &str) -> ApiResponse {
    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);
    ApiResponse::error(
        STATUS_NOT_FOUND,
        "not_found",
        format!("no route for GET {path}"),
        None,
    )
}

/// Extracts `{groupId}` from `/groups/{groupId}/activity-feed[?...]`.
fn route_group_id(path_and_query: &str) -> Option<GroupId> {
    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);
    let mut segments = path.trim_matches('/').split('/');
    match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some("groups"), Some(group_id), Some("activity-feed"), None) => group_id
            .parse::<GroupId>()
            .ok()
            .filter(|group_id| *group_id > 0),
        _ => None,
    }
}

fn query_part(path_and_query: &str) -> &str {
    path_and_query
        .split_once('?')
        .map_or("", |(_, query)| query)
}

fn resolve_feed_db_path() -> PathBuf {
    FEED_DB_PATH
        .get_or_init(|| feed_db_path_from(std::env::var(FEED_DB_PATH_ENV).ok()))
        .clone()
}

/// Configured path when set and non-blank, else a file in the temp dir.
fn feed_db_path_from(configured: Option<String>) -> PathBuf {
    match configured.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => std::env::temp_dir().join(FEED_DB_FILE_NAME),
    }
}
