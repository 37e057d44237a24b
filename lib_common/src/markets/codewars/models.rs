use serde::{Deserialize, Serialize};

/// A kata as returned by `GET /code-challenges/{id}`.
///
/// Only the fields the service stores are modelled; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodewarsKata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// A user profile as returned by `GET /users/{username}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodewarsUser {
    pub username: String,
    #[serde(default)]
    pub honor: i64,
}

/// One page of `GET /code-challenges?page=&pageSize=`.
#[derive(Debug, Deserialize)]
pub(crate) struct ListingPage {
    #[serde(default)]
    pub data: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingItem {
    pub id: String,
}
