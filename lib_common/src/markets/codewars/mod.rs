//! # Codewars Integration Module
//!
//! This module provides the interface for interacting with Codewars.
//!
//! ## Contained Modules:
//!
//! - **`apicall`**: The `CodewarsApi` trait (the seam consumed by the kata
//!   buffer and the domain services) and its `reqwest`-backed implementation.
//! - **`models`**: Wire models for katas, users and listing pages.
//! - **`error`**: The `CodewarsError` taxonomy.

/// The `CodewarsApi` trait and the HTTP implementation.
pub mod apicall;
/// Error taxonomy for upstream calls.
pub mod error;
/// Wire models returned by Codewars.
pub mod models;

pub use apicall::{ApiCallCodewars, CodewarsApi, CodewarsSettings};
pub use error::CodewarsError;
pub use models::{CodewarsKata, CodewarsUser};
