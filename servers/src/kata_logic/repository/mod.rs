//! # Repositories
//!
//! Persistence contracts for users and katas. Both are upserts keyed by a
//! stable business id (username, kata id) with a read-back by that id.
//!
//! The one rule every implementation has to enforce itself: the creation
//! timestamp (`User::created_at`, `Kata::added_at`) is written on first
//! insert only. An update path that rewrites it is a bug, so the SQL and the
//! in-memory map both leave it alone on conflict.

use async_trait::async_trait;
use thiserror::Error;

use crate::kata_logic::model::{Kata, User};

pub mod memory;
pub mod postgres;

pub use memory::{MemoryKataRepository, MemoryUserRepository};
pub use postgres::{PgKataRepository, PgUserRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The row does not exist. Distinct from a storage failure.
    #[error("{what} not found in storage")]
    NotFound { what: String },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user or refreshes its honor. `user.created_at` is only used
    /// when no row exists yet.
    async fn upsert_user(&self, user: &User) -> Result<(), RepositoryError>;

    /// Returns `RepositoryError::NotFound` when the username was never stored.
    async fn get_user(&self, username: &str) -> Result<User, RepositoryError>;
}

#[async_trait]
pub trait KataRepository: Send + Sync {
    /// Inserts the kata or refreshes its mutable fields. `kata.added_at` is
    /// only used when no row exists yet.
    async fn upsert_kata(&self, kata: &Kata) -> Result<(), RepositoryError>;

    /// Returns `RepositoryError::NotFound` when the id was never stored.
    async fn get_kata(&self, id: &str) -> Result<Kata, RepositoryError>;
}
