//! HTTP client for the Graph API endpoints the sync uses.
//!
//! Every call is a single request with the configured timeout. Errors reported inside
//! JSON bodies are surfaced as [`GraphError::Api`] for listing calls; reply creation
//! returns the raw body so the caller can classify it.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::GraphError;
use super::models::{ApiErrorBody, Page, PageAccount, PermissionEntry};
use crate::config::Config;
use crate::constants::{COMMENT_FIELDS, FEED_FIELDS, USER_AGENT};

/// Graph API client bound to one access token.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    api_root: Url,
    access_token: String,
}

impl GraphClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, GraphError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let mut api_root = Url::parse(&config.graph_api_base)?;
        api_root
            .path_segments_mut()
            .map_err(|()| GraphError::InvalidBaseUrl(config.graph_api_base.clone()))?
            .pop_if_empty()
            .push(config.graph_api_version.trim_matches('/'));

        Ok(Self {
            http,
            api_root,
            access_token: config.access_token.clone(),
        })
    }

    /// URL of the first page of the target's feed.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn feed_url(&self, target_id: &str) -> Result<String, GraphError> {
        self.listing_url(&[target_id, "feed"], Some(FEED_FIELDS))
    }

    /// URL of the first page of a post's comments.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn comments_url(&self, post_id: &str) -> Result<String, GraphError> {
        self.listing_url(&[post_id, "comments"], Some(COMMENT_FIELDS))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GraphError> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| GraphError::InvalidBaseUrl(self.api_root.to_string()))?
            .extend(segments);
        Ok(url)
    }

    fn listing_url(&self, segments: &[&str], fields: Option<&str>) -> Result<String, GraphError> {
        let mut url = self.endpoint(segments)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(fields) = fields {
                query.append_pair("fields", fields);
            }
            query.append_pair("access_token", &self.access_token);
        }
        Ok(url.into())
    }

    /// Fetch one listing page. The URL is used verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-JSON body, an `error` object in the
    /// body, or a body that is not a listing envelope.
    pub async fn get_page(&self, url: &str) -> Result<Page, GraphError> {
        let value = self.get_json(url).await?;
        serde_json::from_value(value.clone())
            .map_err(|e| GraphError::unparseable(e, &value.to_string()))
    }

    /// GET a URL and return its JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-JSON body, or an `error` object.
    pub async fn get_json(&self, url: &str) -> Result<Value, GraphError> {
        debug!(url = %redact_url(url), "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        parse_body(status, &body)
    }

    /// Post a reply to a comment and return the raw response body.
    ///
    /// Bodies carrying an `error` object are returned as `Ok` so the caller can
    /// classify them.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-JSON body.
    pub async fn post_reply(&self, comment_id: &str, message: &str) -> Result<Value, GraphError> {
        let url = self.endpoint(&[comment_id, "comments"])?;
        debug!(url = %url, comment_id = %comment_id, "POST reply");

        let response = self
            .http
            .post(url)
            .form(&[("message", message), ("access_token", self.access_token.as_str())])
            .send()
            .await?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GraphError::unparseable(e, &body))
    }

    /// Pages managed by the token's user (`me/accounts`).
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn page_accounts(&self) -> Result<Vec<PageAccount>, GraphError> {
        let url = self.listing_url(&["me", "accounts"], None)?;
        let page = self.get_page(&url).await?;
        Ok(page
            .data
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }

    /// Permissions attached to the token (`me/permissions`).
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn permissions(&self) -> Result<Vec<PermissionEntry>, GraphError> {
        let url = self.listing_url(&["me", "permissions"], None)?;
        let page = self.get_page(&url).await?;
        Ok(page
            .data
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect())
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("api_root", &self.api_root.as_str())
            .finish_non_exhaustive()
    }
}

fn parse_body(status: StatusCode, body: &str) -> Result<Value, GraphError> {
    let value: Value = serde_json::from_str(body).map_err(|e| GraphError::unparseable(e, body))?;

    if let Some(error) = ApiErrorBody::from_response(&value) {
        return Err(GraphError::Api(error));
    }

    if !status.is_success() {
        return Err(GraphError::Status {
            status: status.as_u16(),
            body: super::error::snippet(body),
        });
    }

    Ok(value)
}

/// Replace the `access_token` query value so a URL can be logged.
#[must_use]
pub fn redact_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.split('?').next().unwrap_or_default().to_string();
    };

    if parsed.query().is_none() {
        return parsed.into();
    }

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "access_token" {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.into()
}
