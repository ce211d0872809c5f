//! Typed payloads exchanged with the Graph API.
//!
//! Listing responses are parsed in two steps: the page envelope first, then each item
//! individually, so one malformed post or comment never discards its whole page.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author descriptor (`from`) attached to posts and comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A post in the target's feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub from: Option<Author>,
    /// Kept verbatim; the shape varies by attachment type.
    #[serde(default)]
    pub attachments: Option<Value>,
    #[serde(default)]
    pub permalink_url: Option<String>,
}

/// A comment on a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub from: Option<Author>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub like_count: u64,
}

/// Accept an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Comment {
    /// The comment identifier, if present and non-empty.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    #[must_use]
    pub fn author_name(&self) -> &str {
        self.from
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .unwrap_or("Unknown")
    }

    /// The message truncated to `max_chars` characters, with an ellipsis when cut.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        let message = self.message.as_deref().unwrap_or_default();
        if message.chars().count() > max_chars {
            let cut: String = message.chars().take(max_chars).collect();
            format!("{cut}...")
        } else {
            message.to_string()
        }
    }
}

/// One page of a listing response.
#[derive(Debug, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

impl Page {
    /// The server-provided URL of the following page, if any.
    #[must_use]
    pub fn next_url(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

/// The `error` object of a failed Graph API call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ApiErrorBody {
    /// Extract the `error` object from a response body, if it has one.
    #[must_use]
    pub fn from_response(body: &Value) -> Option<Self> {
        let error = body.get("error")?;
        if !error.is_object() {
            return Some(Self {
                message: Some(error.to_string()),
                ..Self::default()
            });
        }
        Some(serde_json::from_value(error.clone()).unwrap_or_else(|_| Self {
            message: Some(error.to_string()),
            ..Self::default()
        }))
    }

    #[must_use]
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("Unknown error")
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "(#{code}) {}", self.message_or_default()),
            None => f.write_str(self.message_or_default()),
        }
    }
}

/// An entry of `me/accounts`: a page the token's user manages.
#[derive(Debug, Clone, Deserialize)]
pub struct PageAccount {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// An entry of `me/permissions`.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionEntry {
    pub permission: String,
    #[serde(default)]
    pub status: String,
}

impl PermissionEntry {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.status == "granted"
    }
}
