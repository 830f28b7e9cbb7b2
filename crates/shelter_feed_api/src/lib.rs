//! Endpoint surface for the group activity feed.

pub mod api;
