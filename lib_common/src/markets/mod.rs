//! # Upstream Market APIs Module
//!
//! This module groups the client implementations for the external services
//! the system reads from. Its purpose is to abstract the details of talking
//! to those services and hand normalized models to the rest of the system.
//!
//! ## Contained Modules:
//!
//! - **`codewars`**: Client, models and error taxonomy for the public
//!   Codewars API (kata by id, user by name, paged kata listing) plus the
//!   HTML search page used as a scrape source.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Client for interacting with the Codewars API and search page.
pub mod codewars;
