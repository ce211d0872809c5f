//! Per-post snapshot files.
//!
//! Each post is persisted as one pretty-printed JSON file under the posts directory.
//! Snapshots are the baseline for detecting new comments on the next run.
//!
//! There is no file locking: two runs sharing one posts directory can overwrite each
//! other's snapshots and reply to the same comments twice. Run one sync per directory.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::LAST_UPDATED_FORMAT;
use crate::graph::{Comment, Post};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize snapshot for post {post_id}: {source}")]
    Serialize {
        post_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A post and every comment known for it, as last written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSnapshot {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub comments_count: usize,
    #[serde(default)]
    pub last_updated: String,
}

impl PostSnapshot {
    /// Build a snapshot stamped with the current local time.
    #[must_use]
    pub fn new(post: Post, comments: Vec<Comment>) -> Self {
        let last_updated = chrono::Local::now().format(LAST_UPDATED_FORMAT).to_string();
        Self {
            post,
            comments_count: comments.len(),
            comments,
            last_updated,
        }
    }

    /// Identifiers of all stored comments that have one.
    #[must_use]
    pub fn comment_ids(&self) -> HashSet<String> {
        self.comments
            .iter()
            .filter_map(Comment::id)
            .map(str::to_owned)
            .collect()
    }
}

/// Identifiers known from a previous snapshot; empty when there is none.
#[must_use]
pub fn known_ids(snapshot: Option<&PostSnapshot>) -> HashSet<String> {
    snapshot.map(PostSnapshot::comment_ids).unwrap_or_default()
}

/// Snapshot file name for a post identifier.
///
/// ASCII letters and digits are kept, `_` becomes `-`, and every other byte is written
/// as `%XX`. Distinct identifiers always map to distinct names.
#[must_use]
pub fn file_name(post_id: &str) -> String {
    let mut name = String::with_capacity(post_id.len() + 10);
    name.push_str("post_");
    for byte in post_id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => name.push(char::from(byte)),
            b'_' => name.push('-'),
            _ => {
                let _ = write!(name, "%{byte:02X}");
            }
        }
    }
    name.push_str(".json");
    name
}

/// Directory of post snapshots.
#[derive(Debug, Clone)]
pub struct CommentStore {
    dir: PathBuf,
}

impl CommentStore {
    /// Open the store, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::Io {
                action: "create directory",
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, post_id: &str) -> PathBuf {
        self.dir.join(file_name(post_id))
    }

    /// Load the snapshot for a post.
    ///
    /// A missing, unreadable, or corrupt file yields `None`.
    pub async fn load(&self, post_id: &str) -> Option<PostSnapshot> {
        let path = self.path_for(post_id);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(post_id = %post_id, "No snapshot on disk");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read snapshot, treating as absent");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt snapshot, treating as absent");
                None
            }
        }
    }

    /// Write a snapshot, replacing any previous one for the same post.
    ///
    /// The JSON is written to a temporary file next to the target and renamed over it,
    /// so a crash mid-write leaves the previous snapshot intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized or written.
    pub async fn save(&self, snapshot: &PostSnapshot) -> Result<PathBuf, StoreError> {
        let path = self.path_for(&snapshot.post.id);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Serialize {
            post_id: snapshot.post.id.clone(),
            source,
        })?;

        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|source| StoreError::Io {
                action: "write",
                path: tmp_path.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io {
                action: "rename snapshot into",
                path,
                source,
            });
        }

        Ok(path)
    }
}
