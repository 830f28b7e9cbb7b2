//! Feed filter parsing and validation.
//!
//! # Responsibility
//! - Turn raw query parameters into a typed `FeedFilter` or a field-named
//!   rejection.
//! - Translate inclusive date bounds into a half-open millisecond window.
//!
//! # Invariants
//! - `limit` is always within `1..=FEED_LIMIT_MAX` after parsing.
//! - `from <= to` whenever both are present.
//! - Tag names are trimmed, ASCII-lowercased and deduplicated.
//! - Parsing has no side effects.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::IntErrorKind;

/// Page size used when the caller does not ask for one.
pub const FEED_DEFAULT_LIMIT: u32 = 20;
/// Largest page size the merge step will ever be asked for.
pub const FEED_LIMIT_MAX: u32 = 100;
/// Highest rating counted as a poor session.
pub const POOR_RATING_MAX: u8 = 2;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Unvalidated feed parameters as they arrive from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawFeedParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(alias = "animalId", alias = "animal_id")]
    pub animal: Option<String>,
    /// Comma-separated tag names.
    pub tags: Option<String>,
    pub rating: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RawFeedParams {
    /// Decodes a URL query string (with or without the leading `?`).
    ///
    /// Unknown keys are ignored.
    pub fn from_query(query: &str) -> Result<Self, FilterError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        serde_urlencoded::from_str(query).map_err(|err| FilterError::MalformedQuery(err.to_string()))
    }
}

/// Which source families a request wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedType {
    #[default]
    All,
    Comments,
    Announcements,
}

impl FeedType {
    pub fn includes_announcements(self) -> bool {
        matches!(self, Self::All | Self::Announcements)
    }

    pub fn includes_comments(self) -> bool {
        matches!(self, Self::All | Self::Comments)
    }
}

/// Session rating filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingFilter {
    /// Exact rating in `1..=5`.
    Exactly(u8),
    /// Any rating at or below `POOR_RATING_MAX`.
    Poor,
}

impl RatingFilter {
    /// Whether a stored rating satisfies this filter. Unrated never matches.
    pub fn matches(self, rating: Option<u8>) -> bool {
        match (self, rating) {
            (Self::Exactly(wanted), Some(value)) => value == wanted,
            (Self::Poor, Some(value)) => value <= POOR_RATING_MAX,
            (_, None) => false,
        }
    }
}

/// Half-open creation-time window in epoch milliseconds: `[start, end)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreatedWindow {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
}

/// Validated feed filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    pub limit: u32,
    pub offset: u32,
    pub feed_type: FeedType,
    pub animal_id: Option<i64>,
    /// Lowercase tag names; a comment matches when it carries any of them.
    pub tags: Vec<String>,
    pub rating: Option<RatingFilter>,
    /// Inclusive lower date bound (UTC).
    pub from: Option<NaiveDate>,
    /// Inclusive upper date bound (UTC).
    pub to: Option<NaiveDate>,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            limit: FEED_DEFAULT_LIMIT,
            offset: 0,
            feed_type: FeedType::All,
            animal_id: None,
            tags: Vec::new(),
            rating: None,
            from: None,
            to: None,
        }
    }
}

impl FeedFilter {
    /// Whether any attribute only comments can satisfy is set.
    ///
    /// Announcements never match such a filter.
    pub fn has_comment_only_attributes(&self) -> bool {
        self.animal_id.is_some() || !self.tags.is_empty() || self.rating.is_some()
    }

    /// Whether announcements can appear at all under this filter.
    ///
    /// False when the type excludes them or when any comment-only attribute
    /// is requested: a requested attribute announcements cannot have means no
    /// announcement matches.
    pub fn admits_announcements(&self) -> bool {
        self.feed_type.includes_announcements() && !self.has_comment_only_attributes()
    }

    /// Whether comments can appear at all under this filter.
    pub fn admits_comments(&self) -> bool {
        self.feed_type.includes_comments()
    }

    /// Creation-time window equivalent to the inclusive `from`/`to` dates.
    pub fn created_window(&self) -> CreatedWindow {
        CreatedWindow {
            start_ms: self.from.map(start_of_day_ms),
            end_ms: self.to.and_then(|to| to.succ_opt()).map(start_of_day_ms),
        }
    }
}

/// Filter rejection. Every variant names the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    MalformedQuery(String),
    NotAnInteger { field: &'static str, value: String },
    OutOfRange { field: &'static str, value: i64 },
    NegativeOffset(i64),
    UnknownType(String),
    InvalidRating(String),
    InvalidDate { field: &'static str, value: String },
    InvertedDateRange { from: NaiveDate, to: NaiveDate },
}

impl FilterError {
    /// Name of the query parameter that caused the rejection.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MalformedQuery(_) => "query",
            Self::NotAnInteger { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::InvalidDate { field, .. } => field,
            Self::NegativeOffset(_) => "offset",
            Self::UnknownType(_) => "type",
            Self::InvalidRating(_) => "rating",
            Self::InvertedDateRange { .. } => "from",
        }
    }
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedQuery(message) => write!(f, "malformed query string: {message}"),
            Self::NotAnInteger { field, value } => {
                write!(f, "`{field}` must be an integer, got `{value}`")
            }
            Self::OutOfRange { field, value } => write!(f, "`{field}` is out of range: {value}"),
            Self::NegativeOffset(value) => write!(f, "`offset` must not be negative, got {value}"),
            Self::UnknownType(value) => write!(
                f,
                "`type` must be one of all|comments|announcements, got `{value}`"
            ),
            Self::InvalidRating(value) => {
                write!(f, "`rating` must be 1-5 or `poor`, got `{value}`")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "`{field}` must be a YYYY-MM-DD date, got `{value}`")
            }
            Self::InvertedDateRange { from, to } => {
                write!(f, "`from` ({from}) must not be after `to` ({to})")
            }
        }
    }
}

impl Error for FilterError {}

/// Validates raw parameters into a `FeedFilter`.
///
/// Rules:
/// - `limit` defaults to 20 and is clamped into `1..=100` rather than rejected.
/// - `offset` defaults to 0; negative values are rejected.
/// - `rating` accepts `1`..`5` or `poor`.
/// - `from`/`to` are inclusive `YYYY-MM-DD` dates; `from > to` is rejected.
///
/// # Errors
/// Returns the first invalid field, checked in parameter order.
pub fn parse_filter(raw: &RawFeedParams) -> Result<FeedFilter, FilterError> {
    let limit = match present(&raw.limit) {
        Some(value) => parse_limit(value)?,
        None => FEED_DEFAULT_LIMIT,
    };

    let offset = match present(&raw.offset) {
        Some(value) => {
            let parsed = parse_integer("offset", value)?;
            if parsed < 0 {
                return Err(FilterError::NegativeOffset(parsed));
            }
            u32::try_from(parsed).map_err(|_| FilterError::OutOfRange {
                field: "offset",
                value: parsed,
            })?
        }
        None => 0,
    };

    let feed_type = match present(&raw.kind) {
        Some(value) => parse_feed_type(value)?,
        None => FeedType::All,
    };

    let animal_id = match present(&raw.animal) {
        Some(value) => {
            let parsed = parse_integer("animal", value)?;
            if parsed <= 0 {
                return Err(FilterError::OutOfRange {
                    field: "animal",
                    value: parsed,
                });
            }
            Some(parsed)
        }
        None => None,
    };

    let tags = present(&raw.tags).map(parse_tag_list).unwrap_or_default();

    let rating = match present(&raw.rating) {
        Some(value) => Some(parse_rating(value)?),
        None => None,
    };

    let from = present(&raw.from)
        .map(|value| parse_date("from", value))
        .transpose()?;
    let to = present(&raw.to)
        .map(|value| parse_date("to", value))
        .transpose()?;
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(FilterError::InvertedDateRange { from, to });
        }
    }

    Ok(FeedFilter {
        limit,
        offset,
        feed_type,
        animal_id,
        tags,
        rating,
        from,
        to,
    })
}

/// Splits, normalizes and deduplicates a comma-separated tag list.
pub fn parse_tag_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_integer(field: &'static str, value: &str) -> Result<i64, FilterError> {
    value.parse::<i64>().map_err(|_| FilterError::NotAnInteger {
        field,
        value: value.to_string(),
    })
}

/// Clamps into `1..=FEED_LIMIT_MAX`, including values beyond `i64`.
fn parse_limit(value: &str) -> Result<u32, FilterError> {
    let parsed = match value.parse::<i64>() {
        Ok(parsed) => parsed,
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => return Ok(FEED_LIMIT_MAX),
            IntErrorKind::NegOverflow => return Ok(1),
            _ => {
                return Err(FilterError::NotAnInteger {
                    field: "limit",
                    value: value.to_string(),
                })
            }
        },
    };
    // Both bounds fit in u32, so the cast cannot truncate.
    Ok(parsed.clamp(1, i64::from(FEED_LIMIT_MAX)) as u32)
}

fn parse_feed_type(value: &str) -> Result<FeedType, FilterError> {
    match value.to_ascii_lowercase().as_str() {
        "all" => Ok(FeedType::All),
        "comments" | "comment" => Ok(FeedType::Comments),
        "announcements" | "announcement" => Ok(FeedType::Announcements),
        _ => Err(FilterError::UnknownType(value.to_string())),
    }
}

fn parse_rating(value: &str) -> Result<RatingFilter, FilterError> {
    if value.eq_ignore_ascii_case("poor") {
        return Ok(RatingFilter::Poor);
    }
    match value.parse::<u8>() {
        Ok(rating @ 1..=5) => Ok(RatingFilter::Exactly(rating)),
        _ => Err(FilterError::InvalidRating(value.to_string())),
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, FilterError> {
    let invalid = || FilterError::InvalidDate {
        field,
        value: value.to_string(),
    };
    if !ISO_DATE_RE.is_match(value) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

fn start_of_day_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}
