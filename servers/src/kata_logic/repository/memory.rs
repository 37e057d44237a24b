//! In-process repositories with the same upsert contract as the Postgres ones.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{KataRepository, RepositoryError, UserRepository};
use crate::kata_logic::model::{Kata, User};

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn upsert_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users
            .entry(user.username.clone())
            .and_modify(|stored| stored.honor = user.honor)
            .or_insert_with(|| user.clone());
        Ok(())
    }

    async fn get_user(&self, username: &str) -> Result<User, RepositoryError> {
        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                what: format!("user {username:?}"),
            })
    }
}

#[derive(Debug, Default)]
pub struct MemoryKataRepository {
    katas: RwLock<HashMap<String, Kata>>,
}

impl MemoryKataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.katas.read().await.len()
    }
}

#[async_trait]
impl KataRepository for MemoryKataRepository {
    async fn upsert_kata(&self, kata: &Kata) -> Result<(), RepositoryError> {
        let mut katas = self.katas.write().await;
        katas
            .entry(kata.id.clone())
            .and_modify(|stored| {
                let added_at = stored.added_at;
                *stored = Kata {
                    added_at,
                    ..kata.clone()
                };
            })
            .or_insert_with(|| kata.clone());
        Ok(())
    }

    async fn get_kata(&self, id: &str) -> Result<Kata, RepositoryError> {
        self.katas
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                what: format!("kata {id:?}"),
            })
    }
}
