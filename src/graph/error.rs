use thiserror::Error;

use super::models::ApiErrorBody;

/// Errors produced by Graph API calls.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Network failure, timeout, or client setup failure.
    ///
    /// The request URL is stripped on conversion since listing URLs carry the token.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body carried an `error` object.
    #[error("API error {0}")]
    Api(ApiErrorBody),

    /// Non-success status whose body had no `error` object.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response was not the JSON shape we expected.
    #[error("unparseable response ({reason}): {body}")]
    Unparseable { reason: String, body: String },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("base URL cannot carry path segments: {0}")]
    InvalidBaseUrl(String),
}

impl From<reqwest::Error> for GraphError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.without_url())
    }
}

impl GraphError {
    /// The Graph API error code, for API-reported errors.
    #[must_use]
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Api(body) => body.code,
            _ => None,
        }
    }

    pub(crate) fn unparseable(reason: impl ToString, body: &str) -> Self {
        Self::Unparseable {
            reason: reason.to_string(),
            body: snippet(body),
        }
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn snippet(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    if body.chars().count() > MAX_CHARS {
        let cut: String = body.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}
