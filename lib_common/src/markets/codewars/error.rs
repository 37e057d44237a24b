use thiserror::Error;

use crate::retrieve::ky_http::RetrieveError;

/// Failures surfaced by a [`CodewarsApi`](super::CodewarsApi) call.
///
/// Transport, status and decode failures come from the retrieval layer;
/// `NotFound` is split out so callers can tell "absent upstream" apart from
/// "upstream unreachable".
#[derive(Debug, Error)]
pub enum CodewarsError {
    #[error("{what} not found on Codewars")]
    NotFound { what: String },

    #[error(transparent)]
    Request(#[from] RetrieveError),
}

impl CodewarsError {
    /// Maps a 404 answer onto `NotFound`, keeping every other failure as is.
    pub(crate) fn classify(err: RetrieveError, what: impl FnOnce() -> String) -> Self {
        match err.status() {
            Some(404) => CodewarsError::NotFound { what: what() },
            _ => CodewarsError::Request(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status_becomes_not_found() {
        let err = RetrieveError::Status {
            status: 404,
            url: "http://x/users/ghost".into(),
        };
        let err = CodewarsError::classify(err, || "user \"ghost\"".to_string());
        assert!(matches!(err, CodewarsError::NotFound { .. }));
        assert_eq!(err.to_string(), "user \"ghost\" not found on Codewars");
    }

    #[test]
    fn other_statuses_stay_status_errors() {
        let err = RetrieveError::Status {
            status: 502,
            url: "http://x/".into(),
        };
        let err = CodewarsError::classify(err, || unreachable!());
        assert!(matches!(
            err,
            CodewarsError::Request(RetrieveError::Status { status: 502, .. })
        ));
    }
}
