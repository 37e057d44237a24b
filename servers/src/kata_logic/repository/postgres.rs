use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use super::{KataRepository, RepositoryError, UserRepository};
use crate::kata_logic::model::{Kata, User};

/// Embedded schema, applied at startup before the server binds.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn upsert_user(&self, user: &User) -> Result<(), RepositoryError> {
        // created_at is deliberately absent from the UPDATE list.
        let query = r#"
            INSERT INTO users (username, honor, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ON CONFLICT (username) DO UPDATE SET
                honor = EXCLUDED.honor,
                updated_at = EXCLUDED.updated_at
        "#;
        sqlx::query(query)
            .bind(&user.username)
            .bind(user.honor)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;

        debug!(username = %user.username, honor = user.honor, "user upserted");
        Ok(())
    }

    async fn get_user(&self, username: &str) -> Result<User, RepositoryError> {
        let row: Option<(String, i64, DateTime<Utc>)> =
            sqlx::query_as("SELECT username, honor, created_at FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(username, honor, created_at)| User {
            username,
            honor,
            created_at,
        })
        .ok_or_else(|| RepositoryError::NotFound {
            what: format!("user {username:?}"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgKataRepository {
    pool: PgPool,
}

impl PgKataRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type KataRow = (
    String,
    String,
    String,
    String,
    Json<Vec<String>>,
    Json<Vec<String>>,
    DateTime<Utc>,
);

#[async_trait]
impl KataRepository for PgKataRepository {
    async fn upsert_kata(&self, kata: &Kata) -> Result<(), RepositoryError> {
        // added_at is deliberately absent from the UPDATE list.
        let query = r#"
            INSERT INTO katas (id, name, slug, url, tags, languages, added_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                slug = EXCLUDED.slug,
                url = EXCLUDED.url,
                tags = EXCLUDED.tags,
                languages = EXCLUDED.languages,
                updated_at = NOW()
        "#;
        sqlx::query(query)
            .bind(&kata.id)
            .bind(&kata.name)
            .bind(&kata.slug)
            .bind(&kata.url)
            .bind(Json(&kata.tags))
            .bind(Json(&kata.languages))
            .bind(kata.added_at)
            .execute(&self.pool)
            .await?;

        debug!(id = %kata.id, "kata upserted");
        Ok(())
    }

    async fn get_kata(&self, id: &str) -> Result<Kata, RepositoryError> {
        let row: Option<KataRow> = sqlx::query_as(
            "SELECT id, name, slug, url, tags, languages, added_at FROM katas WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, name, slug, url, Json(tags), Json(languages), added_at)| Kata {
            id,
            name,
            slug,
            url,
            tags,
            languages,
            added_at,
        })
        .ok_or_else(|| RepositoryError::NotFound {
            what: format!("kata {id:?}"),
        })
    }
}
