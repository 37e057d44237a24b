//! # lib_common
//!
//! Shared building blocks for the kata solver API: an HTTP retrieval client,
//! the Postgres connection pool, the Codewars upstream client and the kata ID
//! buffer that serves random picks without re-scanning Codewars per request.
//!
//! Every folder is gated behind a cargo feature of the same name; `full`
//! (the default) turns them all on.

#[cfg(feature = "connections")]
pub mod connections;
#[cfg(feature = "core")]
pub mod core;
#[cfg(feature = "markets")]
pub mod markets;
#[cfg(feature = "retrieve")]
pub mod retrieve;
