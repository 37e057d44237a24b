//! # Codewars API Client
//!
//! This module provides the client for the public Codewars API and its HTML
//! kata search page.
//!
//! ## Core Features:
//! - **Seam trait**: Consumers (the kata buffer, the domain services) depend
//!   on [`CodewarsApi`], never on the concrete client, so the client is
//!   passed in explicitly and can be replaced by a stub in tests.
//! - **Fixed timeout**: Every call is bounded by the timeout configured in
//!   [`CodewarsSettings`] (10 seconds by default).
//! - **No retries**: Failures are classified and returned; callers decide.
//! - **Stateless**: The client only holds its URLs and the transport, so one
//!   instance is shared by every request handler and background task.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::debug;
use url::Url;

use super::error::CodewarsError;
use super::models::{CodewarsKata, CodewarsUser, ListingPage};
use crate::retrieve::ky_http::{ApiClient, RetrieveError, DEFAULT_MAX_BODY_BYTES};

/// Public Codewars REST API root.
pub const DEFAULT_API_URL: &str = "https://www.codewars.com/api/v1";
/// Rendered kata search page used as a scrape source.
pub const DEFAULT_SEARCH_URL: &str = "https://www.codewars.com/kata/search";
/// Ceiling for a single outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// The operations the rest of the system needs from Codewars.
#[async_trait]
pub trait CodewarsApi: Send + Sync {
    /// Full details of one kata.
    async fn fetch_kata_by_id(&self, id: &str) -> Result<CodewarsKata, CodewarsError>;

    /// Public profile of one user.
    async fn fetch_user(&self, username: &str) -> Result<CodewarsUser, CodewarsError>;

    /// Kata identifiers on one page of the listing endpoint, in upstream order.
    async fn fetch_listing_page(&self, page: u32, page_size: u32) -> Result<Vec<String>, CodewarsError>;

    /// Raw markup of the kata search page.
    async fn fetch_search_page(&self) -> Result<String, CodewarsError>;
}

/// Where and how to reach Codewars.
#[derive(Debug, Clone)]
pub struct CodewarsSettings {
    pub api_url: String,
    pub search_url: String,
    pub timeout: Duration,
}

impl Default for CodewarsSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// `reqwest`-backed [`CodewarsApi`].
#[derive(Debug, Clone)]
pub struct ApiCallCodewars {
    /// Client bound to the REST API root.
    client: ApiClient,
    /// Absolute URL of the search page.
    search_url: Url,
}

impl ApiCallCodewars {
    /// Builds the client, validating both URLs up front.
    pub fn new(settings: &CodewarsSettings) -> Result<Self, CodewarsError> {
        let client = ApiClient::new(&settings.api_url, settings.timeout)?;
        let search_url = Url::parse(&settings.search_url).map_err(|e| RetrieveError::InvalidUrl {
            url: settings.search_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, search_url })
    }

    fn search_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        headers
    }
}

#[async_trait]
impl CodewarsApi for ApiCallCodewars {
    async fn fetch_kata_by_id(&self, id: &str) -> Result<CodewarsKata, CodewarsError> {
        let url = self.client.endpoint(&["code-challenges", id])?;
        self.client
            .get_json::<CodewarsKata>(url, &[])
            .await
            .map_err(|e| CodewarsError::classify(e, || format!("kata {id:?}")))
    }

    async fn fetch_user(&self, username: &str) -> Result<CodewarsUser, CodewarsError> {
        let url = self.client.endpoint(&["users", username])?;
        debug!(%url, "requesting user");
        self.client
            .get_json::<CodewarsUser>(url, &[])
            .await
            .map_err(|e| CodewarsError::classify(e, || format!("user {username:?}")))
    }

    async fn fetch_listing_page(&self, page: u32, page_size: u32) -> Result<Vec<String>, CodewarsError> {
        let url = self.client.endpoint(&["code-challenges"])?;
        let query = [("page", page.to_string()), ("pageSize", page_size.to_string())];
        let listing: ListingPage = self.client.get_json(url, &query).await?;

        Ok(listing.data.into_iter().map(|item| item.id).collect())
    }

    async fn fetch_search_page(&self) -> Result<String, CodewarsError> {
        let html = self
            .client
            .get_text(self.search_url.clone(), Self::search_headers(), DEFAULT_MAX_BODY_BYTES)
            .await?;
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap as RequestHeaders, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve_stub() -> String {
        let app = Router::new()
            .route(
                "/api/v1/code-challenges/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "missing" {
                        return Err(StatusCode::NOT_FOUND);
                    }
                    Ok(Json(json!({
                        "id": id,
                        "name": "Multiply",
                        "slug": "multiply",
                        "url": format!("https://www.codewars.com/kata/{id}"),
                        "tags": ["Fundamentals"],
                        "languages": ["rust", "python"]
                    })))
                }),
            )
            .route(
                "/api/v1/code-challenges",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({
                        "data": [
                            {"id": format!("page{}", q["page"])},
                            {"id": format!("size{}", q["pageSize"])}
                        ]
                    }))
                }),
            )
            .route(
                "/api/v1/users/{name}",
                get(|Path(name): Path<String>| async move {
                    match name.as_str() {
                        "broken" => (StatusCode::OK, "{not json".to_string()),
                        "down" => (StatusCode::SERVICE_UNAVAILABLE, String::new()),
                        _ => (StatusCode::OK, json!({"username": name, "honor": 42}).to_string()),
                    }
                }),
            )
            .route(
                "/kata/search",
                get(|headers: RequestHeaders| async move {
                    let ua = headers
                        .get("user-agent")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    format!("<html><a href=\"/kata/{}\">ua</a></html>", ua.len())
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client_for(base: &str) -> ApiCallCodewars {
        ApiCallCodewars::new(&CodewarsSettings {
            api_url: format!("{base}/api/v1"),
            search_url: format!("{base}/kata/search"),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_kata_details() {
        let client = client_for(&serve_stub().await);
        let kata = client.fetch_kata_by_id("abc").await.unwrap();
        assert_eq!(kata.id, "abc");
        assert_eq!(kata.languages, vec!["rust".to_string(), "python".to_string()]);
    }

    #[tokio::test]
    async fn missing_kata_is_not_found() {
        let client = client_for(&serve_stub().await);
        let err = client.fetch_kata_by_id("missing").await.unwrap_err();
        assert!(matches!(err, CodewarsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn listing_passes_paging_parameters() {
        let client = client_for(&serve_stub().await);
        let ids = client.fetch_listing_page(0, 50).await.unwrap();
        assert_eq!(ids, vec!["page0".to_string(), "size50".to_string()]);
    }

    #[tokio::test]
    async fn user_failures_are_classified() {
        let client = client_for(&serve_stub().await);

        let user = client.fetch_user("alice").await.unwrap();
        assert_eq!(user.honor, 42);

        let err = client.fetch_user("broken").await.unwrap_err();
        assert!(matches!(err, CodewarsError::Request(RetrieveError::Decode { .. })));

        let err = client.fetch_user("down").await.unwrap_err();
        assert!(matches!(
            err,
            CodewarsError::Request(RetrieveError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn search_page_sends_browser_headers() {
        let client = client_for(&serve_stub().await);
        let html = client.fetch_search_page().await.unwrap();
        assert!(html.contains(&format!("/kata/{}", BROWSER_USER_AGENT.len())));
    }

    const SEARCH_IDS: [&str; 6] = [
        "5277c8a221e209d3f6000b56",
        "52742f58faf5485cae000b9a",
        "514b92a657cdc65150000006",
        "54da5a58ea159efa38000836",
        "55bf01e5a717a0d57e0000ec",
        "5541f58a944b85ce6d00006a",
    ];

    fn search_links() -> Vec<u8> {
        let mut html = b"<html><body>".to_vec();
        for id in SEARCH_IDS {
            html.extend_from_slice(format!("<a href=\"/kata/{id}\">kata</a>").as_bytes());
        }
        html
    }

    async fn serve_search_page(body: Vec<u8>) -> String {
        let app = Router::new().route("/kata/search", get(move || async move { body }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn assert_has_all_links(html: &str) {
        for id in SEARCH_IDS {
            assert!(html.contains(&format!("/kata/{id}")), "missing {id}");
        }
    }

    #[tokio::test]
    async fn search_page_with_stray_latin1_byte_keeps_links() {
        let mut body = search_links();
        body.extend_from_slice(b"<p>caf\xe9</p></body></html>");

        let client = client_for(&serve_search_page(body).await);
        let html = client.fetch_search_page().await.unwrap();
        assert_has_all_links(&html);
        assert!(html.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn oversized_search_page_cut_mid_character_keeps_links() {
        let mut body = search_links();
        // Odd remaining room so the cap lands inside a two-byte character.
        if (DEFAULT_MAX_BODY_BYTES - body.len()) % 2 == 0 {
            body.push(b' ');
        }
        body.extend_from_slice("é".repeat(DEFAULT_MAX_BODY_BYTES / 2 + 1).as_bytes());
        assert!(body.len() > DEFAULT_MAX_BODY_BYTES);

        let client = client_for(&serve_search_page(body).await);
        let html = client.fetch_search_page().await.unwrap();
        assert_has_all_links(&html);
        assert!(html.ends_with('\u{FFFD}'));
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}"));
        let err = client.fetch_user("alice").await.unwrap_err();
        assert!(matches!(err, CodewarsError::Request(RetrieveError::Transport { .. })));
    }
}
