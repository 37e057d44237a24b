//! # Kata Solver API
//!
//! The HTTP backend behind `server_kata`: it syncs Codewars user profiles
//! into Postgres and serves random katas drawn from the in-memory kata ID
//! buffer (`lib_common::core::kata_buffer`).
//!
//! Routes:
//! - `GET /health` - liveness plus kata buffer size and age.
//! - `GET /users/{username}` - fetch the profile upstream, upsert, return the stored row.
//! - `GET /katas/random` - pick an id, fetch details upstream, upsert, return a summary.

pub mod kata_logic;
