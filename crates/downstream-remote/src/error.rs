//! Error types for downstream-remote

use downstream_core::RemoteError;
use thiserror::Error;

/// Errors building an API client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Server address is empty or not an http(s) URL
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    /// HTTP client construction failed
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.to_string())
    }
}

/// Longest response body excerpt kept in a [`RemoteError::Status`].
const MAX_BODY_EXCERPT: usize = 200;

pub(crate) fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

pub(crate) fn decode(err: reqwest::Error) -> RemoteError {
    RemoteError::Decode(err.to_string())
}

/// Pass successful responses through; turn anything else into
/// [`RemoteError::Status`] with a body excerpt.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body: excerpt(body.trim()),
    })
}

fn excerpt(s: &str) -> String {
    if s.chars().count() <= MAX_BODY_EXCERPT {
        s.to_string()
    } else {
        let cut: String = s.chars().take(MAX_BODY_EXCERPT).collect();
        format!("{cut}...")
    }
}

/// Validate and normalise a base URL (no trailing slash).
pub(crate) fn base_url(url: &str) -> Result<String, ClientError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ClientError::InvalidUrl(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        assert_eq!(
            base_url("https://drone.example.com/").unwrap(),
            "https://drone.example.com"
        );
        assert_eq!(base_url(" http://localhost:8080 ").unwrap(), "http://localhost:8080");
    }

    #[test]
    fn test_base_url_rejects_non_http() {
        assert!(matches!(base_url(""), Err(ClientError::InvalidUrl(_))));
        assert!(matches!(base_url("drone.example.com"), Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let e = excerpt(&long);
        assert_eq!(e.len(), MAX_BODY_EXCERPT + 3);
        assert!(e.ends_with("..."));
        assert_eq!(excerpt("short"), "short");
    }
}
