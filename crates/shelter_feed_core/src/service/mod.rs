//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate the source readers and pure feed steps into one request.
//! - Keep API/CLI layers decoupled from storage details.

pub mod feed_service;
