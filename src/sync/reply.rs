//! Posting replies to new comments and classifying the results.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::constants::{PERMISSION_ERROR_CODE, PERMISSION_HINTS};
use crate::graph::{ApiErrorBody, Comment, GraphClient, GraphError};

/// Characters of a comment shown in progress logs.
const PREVIEW_CHARS: usize = 50;

/// Result of one reply attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// The platform created the reply.
    Success { reply_id: String },
    /// The platform rejected the reply, or the request never completed.
    Failure {
        code: Option<i64>,
        message: String,
        /// Set for permission errors; the operator should fix token or role.
        permission_hint: bool,
    },
    /// The response had neither an `id` field nor an `error`.
    Indeterminate { body: Value },
}

impl ReplyOutcome {
    /// Classify a reply response body.
    ///
    /// Any `id` field counts as success, whatever its value.
    #[must_use]
    pub fn classify(body: &Value) -> Self {
        if let Some(id) = body.get("id") {
            let reply_id = id
                .as_str()
                .map_or_else(|| id.to_string(), str::to_owned);
            return Self::Success { reply_id };
        }

        if let Some(error) = ApiErrorBody::from_response(body) {
            return Self::failure(error.code, error.message_or_default().to_string());
        }

        Self::Indeterminate { body: body.clone() }
    }

    /// A failure for a request that produced no classifiable body.
    #[must_use]
    pub fn from_error(error: &GraphError) -> Self {
        Self::failure(error.code(), error.to_string())
    }

    fn failure(code: Option<i64>, message: String) -> Self {
        Self::Failure {
            code,
            message,
            permission_hint: code == Some(PERMISSION_ERROR_CODE),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Counts of reply outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplyTally {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub indeterminate: usize,
    pub permission_errors: usize,
}

impl ReplyTally {
    pub fn record(&mut self, outcome: &ReplyOutcome) {
        self.attempted += 1;
        match outcome {
            ReplyOutcome::Success { .. } => self.succeeded += 1,
            ReplyOutcome::Failure {
                permission_hint, ..
            } => {
                self.failed += 1;
                if *permission_hint {
                    self.permission_errors += 1;
                }
            }
            ReplyOutcome::Indeterminate { .. } => self.indeterminate += 1,
        }
    }
}

impl std::ops::AddAssign for ReplyTally {
    fn add_assign(&mut self, other: Self) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.indeterminate += other.indeterminate;
        self.permission_errors += other.permission_errors;
    }
}

/// Replies to comments one at a time with a fixed pause after each attempt.
#[derive(Debug, Clone)]
pub struct ReplyDispatcher {
    client: GraphClient,
    message: String,
    delay: Duration,
}

impl ReplyDispatcher {
    #[must_use]
    pub fn new(client: GraphClient, message: String, delay: Duration) -> Self {
        Self {
            client,
            message,
            delay,
        }
    }

    /// Reply to every comment in order.
    ///
    /// Each comment gets exactly one attempt. The delay follows every attempt whatever
    /// its outcome, and no failure stops the loop.
    pub async fn dispatch(&self, comments: &[Comment]) -> ReplyTally {
        let mut tally = ReplyTally::default();

        for comment in comments {
            let Some(comment_id) = comment.id() else {
                continue;
            };

            info!(
                comment_id = %comment_id,
                from = %comment.author_name(),
                message = %comment.preview(PREVIEW_CHARS),
                "New comment"
            );

            let outcome = self.reply(comment_id).await;
            log_outcome(comment_id, &outcome);
            tally.record(&outcome);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        tally
    }

    /// Post one reply and classify the result.
    pub async fn reply(&self, comment_id: &str) -> ReplyOutcome {
        match self.client.post_reply(comment_id, &self.message).await {
            Ok(body) => ReplyOutcome::classify(&body),
            Err(e) => ReplyOutcome::from_error(&e),
        }
    }
}

fn log_outcome(comment_id: &str, outcome: &ReplyOutcome) {
    match outcome {
        ReplyOutcome::Success { reply_id } => {
            info!(comment_id = %comment_id, reply_id = %reply_id, "Replied to comment");
        }
        ReplyOutcome::Failure {
            code,
            message,
            permission_hint,
        } => {
            warn!(comment_id = %comment_id, code = ?code, error = %message, "Failed to reply to comment");
            if *permission_hint {
                warn!("This is a permissions error. You may need:");
                for hint in PERMISSION_HINTS {
                    warn!("  - {hint}");
                }
            }
        }
        ReplyOutcome::Indeterminate { body } => {
            warn!(comment_id = %comment_id, body = %body, "Unexpected reply response");
        }
    }
}
