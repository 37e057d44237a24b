//! # Kata Server End-to-End Tests
//!
//! Runs the real router against a stub Codewars upstream, both on ephemeral
//! local ports, and drives it with `reqwest`. Persistence uses the in-memory
//! repositories so no database is needed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use lib_common::core::{BufferSettings, KataBuffer};
use lib_common::markets::codewars::{ApiCallCodewars, CodewarsApi, CodewarsSettings};
use serde_json::{Value, json};
use servers::kata_logic::repository::{MemoryKataRepository, MemoryUserRepository};
use servers::kata_logic::routes;
use servers::kata_logic::service::{KataService, UserService};
use servers::kata_logic::state::AppState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

const ID_A: &str = "abc123abc123abc123abc123";
const ID_B: &str = "def456def456def456def456";

/// Mutable upstream fixture: honor per user, known kata ids.
#[derive(Default)]
struct Upstream {
    honor: Mutex<HashMap<String, i64>>,
    katas: Vec<&'static str>,
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_upstream(upstream: Arc<Upstream>) -> String {
    let app = Router::new()
        .route(
            "/api/v1/code-challenges/{id}",
            get(|State(up): State<Arc<Upstream>>, Path(id): Path<String>| async move {
                if !up.katas.iter().any(|known| *known == id) {
                    return Err(StatusCode::NOT_FOUND);
                }
                Ok(Json(json!({
                    "id": id,
                    "name": format!("Kata {}", &id[..3]),
                    "slug": format!("kata-{}", &id[..3]),
                    "url": format!("https://www.codewars.com/kata/{id}"),
                    "tags": ["Fundamentals", "Strings"],
                    "languages": ["rust"]
                })))
            }),
        )
        .route(
            "/api/v1/users/{name}",
            get(|State(up): State<Arc<Upstream>>, Path(name): Path<String>| async move {
                let honor = up.honor.lock().unwrap().get(&name).copied();
                match honor {
                    Some(honor) => Ok(Json(json!({"username": name, "honor": honor}))),
                    None => Err(StatusCode::NOT_FOUND),
                }
            }),
        )
        .with_state(upstream);
    spawn(app).await
}

/// Starts upstream and server; the kata buffer is pre-warmed with `ids`.
async fn start(upstream: Arc<Upstream>, ids: &[&str]) -> (String, Arc<MemoryUserRepository>) {
    let upstream_url = spawn_upstream(upstream).await;
    let api: Arc<dyn CodewarsApi> = Arc::new(
        ApiCallCodewars::new(&CodewarsSettings {
            api_url: format!("{upstream_url}/api/v1"),
            search_url: format!("{upstream_url}/kata/search"),
            timeout: Duration::from_secs(5),
        })
        .unwrap(),
    );

    let buffer = Arc::new(KataBuffer::preloaded(
        Arc::clone(&api),
        BufferSettings::default(),
        ids.iter().map(|s| s.to_string()).collect(),
    ));
    let users_repo = Arc::new(MemoryUserRepository::new());
    let katas = KataService::new(Arc::new(MemoryKataRepository::new()), Arc::clone(&api), Arc::clone(&buffer));
    let users = UserService::new(users_repo.clone(), api);

    let app = routes::router(AppState::new(katas, users, buffer), Duration::from_secs(10));
    (spawn(app).await, users_repo)
}

#[tokio::test]
async fn random_kata_returns_details_of_a_buffered_id() {
    let upstream = Arc::new(Upstream {
        katas: vec![ID_A, ID_B],
        ..Upstream::default()
    });
    let (base, _) = start(upstream, &[ID_A, ID_B]).await;

    let response = reqwest::get(format!("{base}/katas/random")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();
    assert!(id == ID_A || id == ID_B, "unexpected id {id}");
    assert_eq!(body["name"], format!("Kata {}", &id[..3]));
    assert_eq!(body["url"], format!("https://www.codewars.com/kata/{id}"));
    assert_eq!(body["tags"], json!(["Fundamentals", "Strings"]));
}

#[tokio::test]
async fn random_kata_upstream_failure_is_500_with_details() {
    // Buffered id unknown upstream.
    let (base, _) = start(Arc::new(Upstream::default()), &[ID_A]).await;

    let response = reqwest::get(format!("{base}/katas/random")).await.unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to get random kata");
    assert!(
        body["details"]
            .as_str()
            .unwrap()
            .starts_with("failed to get kata details:")
    );
}

#[tokio::test]
async fn user_resync_keeps_first_seen() {
    let upstream = Arc::new(Upstream::default());
    upstream.honor.lock().unwrap().insert("alice".into(), 10);
    let (base, repo) = start(upstream.clone(), &[]).await;

    let first: Value = reqwest::get(format!("{base}/users/alice"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["username"], "alice");
    assert_eq!(first["honor"], 10);

    upstream.honor.lock().unwrap().insert("alice".into(), 25);
    let second: Value = reqwest::get(format!("{base}/users/alice"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["honor"], 25);
    assert_eq!(second["created_at"], first["created_at"]);
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn unknown_user_is_500_with_error() {
    let (base, repo) = start(Arc::new(Upstream::default()), &[]).await;

    let response = reqwest::get(format!("{base}/users/ghost")).await.unwrap();
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not found"));
    assert_eq!(repo.len().await, 0);
}

#[tokio::test]
async fn health_reports_buffer_size() {
    let (base, _) = start(Arc::new(Upstream::default()), &[ID_A, ID_B]).await;

    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["kata_buffer"]["size"], 2);
    let time = body["time"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
    assert!(time.ends_with('Z'));
}
