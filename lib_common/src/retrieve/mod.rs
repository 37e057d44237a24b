//! # Data Retrieval Module
//!
//! This module provides a centralized location for generic data retrieval
//! clients and utilities, primarily focused on HTTP-based interactions.
//!
//! ## Purpose:
//! The goal of the `retrieve` module is to offer a consistent way to fetch
//! data from external services, encapsulating URL building, timeouts, body
//! size limits and error classification. Upstream clients (e.g. Codewars)
//! only deal with paths and payload types.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: A generic HTTP `ApiClient` built on `reqwest` with a fixed
//!   per-call timeout and typed failures (transport, status, decode).

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Generic HTTP API client with typed failures.
pub mod ky_http;
