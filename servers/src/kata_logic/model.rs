use chrono::{DateTime, Utc};
use lib_common::markets::codewars::{CodewarsKata, CodewarsUser};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A Codewars user as stored locally. `username` is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub honor: i64,
    /// Set on first insert only; later syncs never move it.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// `seen_at` becomes `created_at` if this turns out to be the first sync.
    pub fn from_upstream(profile: CodewarsUser, seen_at: DateTime<Utc>) -> Self {
        Self {
            username: profile.username,
            honor: profile.honor,
            created_at: seen_at,
        }
    }
}

/// A kata as stored locally. `id` is the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kata {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub url: String,
    pub tags: Vec<String>,
    pub languages: Vec<String>,
    /// When the kata was first drawn; kept across re-saves.
    pub added_at: DateTime<Utc>,
}

impl Kata {
    pub fn from_upstream(kata: CodewarsKata, discovered_at: DateTime<Utc>) -> Self {
        Self {
            id: kata.id,
            name: kata.name,
            slug: kata.slug,
            url: kata.url,
            tags: distinct(kata.tags),
            languages: distinct(kata.languages),
            added_at: discovered_at,
        }
    }

    pub fn summary(&self) -> KataSummary {
        KataSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            url: self.url.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Body of `GET /katas/random`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KataSummary {
    pub id: String,
    pub name: String,
    pub url: String,
    pub tags: Vec<String>,
}

// Tags and languages are sets; upstream order is kept for display.
fn distinct(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(v.clone())).collect()
}
