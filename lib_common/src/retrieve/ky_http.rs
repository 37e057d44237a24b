//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous API client wrapper around `reqwest`.
//! It resolves endpoints against a base URL, bounds every call with a fixed
//! timeout and classifies failures so callers can tell a dead network from a
//! non-2xx answer or a malformed body.

use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Upper bound used when a caller does not pick its own body limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Failures produced by [`ApiClient`].
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The base URL or a derived endpoint could not be built.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network failure, timeout, or an interrupted body read.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered with a non-2xx status.
    #[error("unexpected status code {status} from {url}")]
    Status { status: u16, url: String },

    /// The body was received but could not be decoded.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RetrieveError {
    /// The HTTP status carried by a [`RetrieveError::Status`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RetrieveError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn transport(url: &Url, source: reqwest::Error) -> Self {
        RetrieveError::Transport {
            url: url.to_string(),
            source: Box::new(source),
        }
    }
}

/// A small asynchronous HTTP client bound to one base URL.
///
/// The client holds no mutable state, so a single instance can be shared
/// between request handlers and background tasks.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The underlying reqwest client (connection pool + timeout).
    inner: reqwest::Client,
    /// The base URL; always ends with `/` so segments append instead of replace.
    base_url: Url,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// # Arguments
    /// * `base_url` - The absolute base URL for the API (e.g. "https://www.codewars.com/api/v1").
    /// * `timeout` - Ceiling applied to every call, connect through body.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RetrieveError> {
        let mut url = Url::parse(base_url.trim()).map_err(|e| RetrieveError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(RetrieveError::InvalidUrl {
                url: base_url.to_string(),
                reason: "url cannot be used as a base".to_string(),
            });
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrieveError::InvalidUrl {
                url: base_url.to_string(),
                reason: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            inner,
            base_url: url,
        })
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, RetrieveError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| RetrieveError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "url cannot be used as a base".to_string(),
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// GETs `url` and decodes a JSON body into `T`.
    ///
    /// # Errors
    /// * `Transport` when the request cannot complete (includes the timeout).
    /// * `Status` for any non-2xx answer.
    /// * `Decode` when the body is not the expected JSON.
    pub async fn get_json<T>(&self, url: Url, query: &[(&str, String)]) -> Result<T, RetrieveError>
    where
        T: DeserializeOwned,
    {
        debug!(%url, "GET json");
        let response = self
            .inner
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| RetrieveError::transport(&url, e))?;

        let body = Self::checked_body(&url, response, DEFAULT_MAX_BODY_BYTES).await?;
        serde_json::from_slice(&body).map_err(|e| RetrieveError::Decode {
            url: url.to_string(),
            source: Box::new(e),
        })
    }

    /// GETs `url` with extra `headers` and returns the body as text,
    /// truncated to `max_bytes`. Invalid UTF-8, including a character split
    /// by the truncation, becomes U+FFFD instead of failing the call.
    pub async fn get_text(
        &self,
        url: Url,
        headers: HeaderMap,
        max_bytes: usize,
    ) -> Result<String, RetrieveError> {
        debug!(%url, "GET text");
        let response = self
            .inner
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| RetrieveError::transport(&url, e))?;

        let body = Self::checked_body(&url, response, max_bytes).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Rejects non-2xx responses, then reads at most `max_bytes` of the body.
    async fn checked_body(
        url: &Url,
        mut response: reqwest::Response,
        max_bytes: usize,
    ) -> Result<Vec<u8>, RetrieveError> {
        let status = response.status();
        if !status.is_success() {
            return Err(RetrieveError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| RetrieveError::transport(url, e))?
        {
            let room = max_bytes - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = ApiClient::new("https://www.codewars.com/api/v1", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url().as_str(), "https://www.codewars.com/api/v1/");
    }

    #[test]
    fn endpoint_appends_and_encodes_segments() {
        let client = ApiClient::new("https://www.codewars.com/api/v1/", Duration::from_secs(1)).unwrap();
        let url = client.endpoint(&["users", "some user"]).unwrap();
        assert_eq!(url.as_str(), "https://www.codewars.com/api/v1/users/some%20user");
    }

    #[test]
    fn relative_base_is_rejected() {
        let err = ApiClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RetrieveError::InvalidUrl { .. }));
    }

    #[test]
    fn status_is_exposed_only_for_status_errors() {
        let err = RetrieveError::Status {
            status: 404,
            url: "http://x/".into(),
        };
        assert_eq!(err.status(), Some(404));

        let err = RetrieveError::Decode {
            url: "http://x/".into(),
            source: "bad".into(),
        };
        assert_eq!(err.status(), None);
    }
}
