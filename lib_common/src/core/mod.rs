//! # Core Engine Module
//!
//! This module holds the stateful heart of the kata solver: the buffer of
//! candidate kata identifiers that lets the service hand out random katas
//! even though Codewars has no "random kata" endpoint.
//!
//! ## Core Components:
//!
//! - **`kata_buffer`**: The ID buffer manager. It owns the identifier list and
//!   its last-refresh timestamp behind one lock, refreshes lazily (at most once
//!   per interval), keeps stale data when a refresh fails and serves uniform
//!   random picks.
//!
//! - **`kata_scrape`**: The scrape fallback extractor. It pulls kata ids out of
//!   the rendered search page and rejects suspiciously small yields.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// The lazily refreshed buffer of candidate kata identifiers.
pub mod kata_buffer;
/// Kata id extraction from the rendered search page.
pub mod kata_scrape;

// --- Public API Re-exports ---
pub use kata_buffer::{BufferError, BufferSettings, BufferStats, KataBuffer, RefreshError};
