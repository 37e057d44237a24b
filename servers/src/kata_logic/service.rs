//! Request-level workflows. Each step's failure is wrapped in the matching
//! [`AppError`] variant, and nothing is persisted unless the upstream fetch
//! succeeded.

use chrono::Utc;
use lib_common::core::KataBuffer;
use lib_common::markets::codewars::CodewarsApi;
use std::sync::Arc;
use tracing::{debug, info};

use crate::kata_logic::error::AppError;
use crate::kata_logic::model::{Kata, User};
use crate::kata_logic::repository::{KataRepository, UserRepository};

#[derive(Clone)]
pub struct KataService {
    repo: Arc<dyn KataRepository>,
    api: Arc<dyn CodewarsApi>,
    buffer: Arc<KataBuffer>,
}

impl KataService {
    pub fn new(repo: Arc<dyn KataRepository>, api: Arc<dyn CodewarsApi>, buffer: Arc<KataBuffer>) -> Self {
        Self { repo, api, buffer }
    }

    /// Draws an id from the buffer, fetches its details, stores them and
    /// returns the stored kata.
    pub async fn get_random_kata(&self) -> Result<Kata, AppError> {
        self.buffer.maybe_refresh().await;
        let id = self.buffer.pick_random().await.map_err(AppError::RandomId)?;
        debug!(%id, "picked kata id");

        let details = self
            .api
            .fetch_kata_by_id(&id)
            .await
            .map_err(AppError::KataDetails)?;

        let kata = Kata::from_upstream(details, Utc::now());
        self.repo.upsert_kata(&kata).await.map_err(AppError::SaveKata)?;

        self.repo.get_kata(&kata.id).await.map_err(AppError::LoadKata)
    }
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    api: Arc<dyn CodewarsApi>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, api: Arc<dyn CodewarsApi>) -> Self {
        Self { repo, api }
    }

    /// Fetches the profile upstream, upserts it and returns the stored row,
    /// whose `created_at` is the first time this user was ever synced.
    pub async fn sync_user(&self, username: &str) -> Result<User, AppError> {
        let profile = self
            .api
            .fetch_user(username)
            .await
            .map_err(|source| AppError::FetchUser {
                username: username.to_string(),
                source,
            })?;

        let user = User::from_upstream(profile, Utc::now());
        self.repo.upsert_user(&user).await.map_err(|source| AppError::SaveUser {
            username: username.to_string(),
            source,
        })?;
        info!(username = %user.username, honor = user.honor, "user synced");

        self.repo.get_user(&user.username).await.map_err(|source| AppError::LoadUser {
            username: username.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kata_logic::repository::{MemoryKataRepository, MemoryUserRepository};
    use async_trait::async_trait;
    use lib_common::core::BufferSettings;
    use lib_common::markets::codewars::{CodewarsError, CodewarsKata, CodewarsUser};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    const ID_A: &str = "5277c8a221e209d3f6000b56";
    const ID_B: &str = "52742f58faf5485cae000b9a";

    #[derive(Default)]
    struct StubApi {
        katas: HashMap<String, CodewarsKata>,
        honor: StdMutex<HashMap<String, i64>>,
    }

    impl StubApi {
        fn with_katas(ids: &[&str]) -> Self {
            let katas = ids
                .iter()
                .map(|id| {
                    let kata = CodewarsKata {
                        id: id.to_string(),
                        name: format!("Kata {id}"),
                        slug: format!("kata-{id}"),
                        url: format!("https://www.codewars.com/kata/{id}"),
                        tags: vec!["Fundamentals".into()],
                        languages: vec!["rust".into()],
                    };
                    (id.to_string(), kata)
                })
                .collect();
            Self {
                katas,
                ..Self::default()
            }
        }

        fn set_honor(&self, username: &str, honor: i64) {
            self.honor.lock().unwrap().insert(username.to_string(), honor);
        }
    }

    #[async_trait]
    impl CodewarsApi for StubApi {
        async fn fetch_kata_by_id(&self, id: &str) -> Result<CodewarsKata, CodewarsError> {
            self.katas.get(id).cloned().ok_or_else(|| CodewarsError::NotFound {
                what: format!("kata {id:?}"),
            })
        }

        async fn fetch_user(&self, username: &str) -> Result<CodewarsUser, CodewarsError> {
            let honor = self.honor.lock().unwrap().get(username).copied();
            honor
                .map(|honor| CodewarsUser {
                    username: username.to_string(),
                    honor,
                })
                .ok_or_else(|| CodewarsError::NotFound {
                    what: format!("user {username:?}"),
                })
        }

        async fn fetch_listing_page(&self, _page: u32, _page_size: u32) -> Result<Vec<String>, CodewarsError> {
            Ok(Vec::new())
        }

        async fn fetch_search_page(&self) -> Result<String, CodewarsError> {
            Ok(String::new())
        }
    }

    fn kata_service(api: Arc<StubApi>, ids: &[&str]) -> (KataService, Arc<MemoryKataRepository>) {
        let repo = Arc::new(MemoryKataRepository::new());
        let buffer = Arc::new(KataBuffer::preloaded(
            api.clone(),
            BufferSettings::default(),
            ids.iter().map(|s| s.to_string()).collect(),
        ));
        (KataService::new(repo.clone(), api, buffer), repo)
    }

    #[tokio::test]
    async fn random_kata_is_fetched_and_stored() {
        let api = Arc::new(StubApi::with_katas(&[ID_A, ID_B]));
        let (service, repo) = kata_service(api, &[ID_A, ID_B]);

        let kata = service.get_random_kata().await.unwrap();
        assert!(kata.id == ID_A || kata.id == ID_B);
        assert_eq!(kata.name, format!("Kata {}", kata.id));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn failed_detail_fetch_persists_nothing() {
        let api = Arc::new(StubApi::with_katas(&[]));
        let (service, repo) = kata_service(api, &[ID_A]);

        let err = service.get_random_kata().await.unwrap_err();
        assert!(matches!(err, AppError::KataDetails(CodewarsError::NotFound { .. })));
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn unavailable_buffer_is_a_random_id_error() {
        // Empty buffer, empty listing, empty search page.
        let api = Arc::new(StubApi::with_katas(&[]));
        let (service, _) = kata_service(api, &[]);

        let err = service.get_random_kata().await.unwrap_err();
        assert!(matches!(err, AppError::RandomId(_)));
        assert!(err.to_string().starts_with("failed to get random ID: "));
    }

    #[tokio::test]
    async fn resync_keeps_first_seen_and_updates_honor() {
        let api = Arc::new(StubApi::default());
        let repo = Arc::new(MemoryUserRepository::new());
        let service = UserService::new(repo.clone(), api.clone());

        api.set_honor("alice", 10);
        let first = service.sync_user("alice").await.unwrap();

        api.set_honor("alice", 25);
        let second = service.sync_user("alice").await.unwrap();

        assert_eq!(second.honor, 25);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_user_is_not_stored() {
        let api = Arc::new(StubApi::default());
        let repo = Arc::new(MemoryUserRepository::new());
        let service = UserService::new(repo.clone(), api);

        let err = service.sync_user("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::FetchUser {
                source: CodewarsError::NotFound { .. },
                ..
            }
        ));
        assert_eq!(repo.len().await, 0);
    }
}
