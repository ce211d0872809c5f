//! Access token bootstrap.
//!
//! Replies posted with a user token usually fail with permission errors, so before
//! syncing a page we look for that page's own access token among the pages the user
//! manages. We also audit the token's permissions so missing ones show up in the log
//! before any reply fails.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{redact_secret, Config, Target};
use crate::constants::REQUIRED_PERMISSIONS;
use crate::graph::{GraphClient, GraphError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no page access token available for page {page_id} (REQUIRE_PAGE_TOKEN is set)")]
    PageTokenUnavailable {
        page_id: String,
        #[source]
        source: Option<GraphError>,
    },
}

/// Where the token used for the sync came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Page access token found through `me/accounts`.
    Page { page_name: Option<String> },
    /// The configured token, unchanged.
    Configured,
}

/// Token chosen at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: String,
    pub source: TokenSource,
}

impl std::fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("token", &redact_secret(&self.token))
            .field("source", &self.source)
            .finish()
    }
}

/// Pick the access token for this run.
///
/// For a page target, the page's own token is preferred. When it cannot be found the
/// configured token is used with a warning, or, if `require_page_token` is set, an
/// error is returned. Group targets always use the configured token.
///
/// # Errors
///
/// Returns an error only when a page token is required and unavailable.
pub async fn resolve_access_token(
    client: &GraphClient,
    config: &Config,
) -> Result<ResolvedToken, AuthError> {
    let page_id = match &config.target {
        Target::Page(page_id) => page_id,
        Target::Group(group_id) => {
            debug!(group_id = %group_id, "Group target, using configured token");
            return Ok(configured(config));
        }
    };

    info!("Attempting to get page access token");
    let lookup_error = match client.page_accounts().await {
        Ok(accounts) => {
            let page_token = accounts
                .into_iter()
                .find(|account| account.id == *page_id)
                .and_then(|account| {
                    account
                        .access_token
                        .filter(|t| !t.is_empty())
                        .map(|token| (token, account.name))
                });

            if let Some((token, page_name)) = page_token {
                info!(
                    page_id = %page_id,
                    page_name = page_name.as_deref().unwrap_or("unknown"),
                    "Using page access token"
                );
                return Ok(ResolvedToken {
                    token,
                    source: TokenSource::Page { page_name },
                });
            }
            debug!(page_id = %page_id, "Page not listed among the user's accounts");
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to look up page access token");
            Some(e)
        }
    };

    if config.require_page_token {
        return Err(AuthError::PageTokenUnavailable {
            page_id: page_id.clone(),
            source: lookup_error,
        });
    }

    warn!("Using configured token; replies might fail with permission errors");
    Ok(configured(config))
}

fn configured(config: &Config) -> ResolvedToken {
    ResolvedToken {
        token: config.access_token.clone(),
        source: TokenSource::Configured,
    }
}

/// Granted permissions and the required ones that are missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionReport {
    pub granted: Vec<String>,
    pub missing: Vec<String>,
}

impl PermissionReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Audit the token's permissions against [`REQUIRED_PERMISSIONS`].
///
/// Advisory only: the result is logged and returned, never enforced.
///
/// # Errors
///
/// Returns an error if the permission listing cannot be fetched.
pub async fn check_permissions(client: &GraphClient) -> Result<PermissionReport, GraphError> {
    let granted: Vec<String> = client
        .permissions()
        .await?
        .into_iter()
        .filter(|entry| entry.is_granted())
        .map(|entry| entry.permission)
        .collect();

    let missing: Vec<String> = REQUIRED_PERMISSIONS
        .iter()
        .filter(|required| !granted.iter().any(|g| g == *required))
        .map(|required| (*required).to_string())
        .collect();

    info!(granted = ?granted, "Granted permissions");
    if missing.is_empty() {
        info!("All required permissions granted");
    } else {
        warn!(missing = ?missing, "Missing permissions");
    }

    Ok(PermissionReport { granted, missing })
}
