//! One full synchronization pass over the target's feed.
//!
//! For every post on every feed page: load the stored snapshot, fetch the current
//! comments, find the new ones, reply to them, and write the snapshot back. Failures are
//! contained to the post they happened in; only a failed feed page ends the pass early.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::delta::{find_new, merge_with_previous};
use super::reply::{ReplyDispatcher, ReplyTally};
use crate::config::Config;
use crate::constants::{EXIT_OK, EXIT_PARTIAL};
use crate::graph::{Comment, GraphClient, Paginator, Post};
use crate::sentiment::{SentimentStats, TOP_COMMENTERS};
use crate::store::{known_ids, CommentStore, PostSnapshot};

/// Counters for one sync pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Whether the feed walk reached its last page.
    pub completed: bool,
    pub abort_reason: Option<String>,
    pub feed_pages: usize,
    pub posts_processed: usize,
    /// Sum over posts of the comments fetched this pass.
    pub comments_seen: usize,
    pub new_comments: usize,
    pub replies: ReplyTally,
    pub snapshots_saved: usize,
    pub save_failures: usize,
    pub unparseable_posts: usize,
    pub unparseable_comments: usize,
    pub comment_walk_errors: usize,
    /// Sentiment over every comment held in this pass's snapshots.
    pub sentiment: SentimentStats,
}

impl RunSummary {
    #[must_use]
    pub fn replies_sent(&self) -> usize {
        self.replies.succeeded
    }

    /// Whether anything went wrong during the pass.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.completed
            || self.replies.failed > 0
            || self.save_failures > 0
            || self.unparseable_posts > 0
            || self.comment_walk_errors > 0
    }

    /// Process exit code for this pass.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            EXIT_PARTIAL
        } else {
            EXIT_OK
        }
    }

    /// Log the end-of-run summary.
    pub fn log(&self) {
        info!(
            completed = self.completed,
            feed_pages = self.feed_pages,
            posts_processed = self.posts_processed,
            comments_seen = self.comments_seen,
            new_comments = self.new_comments,
            replies_sent = self.replies.succeeded,
            replies_failed = self.replies.failed,
            replies_indeterminate = self.replies.indeterminate,
            permission_errors = self.replies.permission_errors,
            save_failures = self.save_failures,
            "Sync finished"
        );

        let top: Vec<String> = self
            .sentiment
            .top_commenters(TOP_COMMENTERS)
            .into_iter()
            .map(|c| format!("{} ({})", c.name, c.comments))
            .collect();
        info!(
            comments = self.sentiment.total(),
            positive = self.sentiment.positive,
            positive_percent = self.sentiment.percent(self.sentiment.positive),
            negative = self.sentiment.negative,
            negative_percent = self.sentiment.percent(self.sentiment.negative),
            neutral = self.sentiment.neutral,
            neutral_percent = self.sentiment.percent(self.sentiment.neutral),
            average_likes = self.sentiment.average_likes(),
            top_commenters = ?top,
            "Comment sentiment"
        );

        if let Some(reason) = &self.abort_reason {
            warn!(reason = %reason, "Feed walk ended early; snapshots written so far are kept");
        }

        if self.new_comments == 0 && self.comments_seen > 0 {
            info!("No new comments; every comment was already processed");
        }
    }
}

/// Comments fetched for one post.
struct FetchedComments {
    comments: Vec<Comment>,
    walk_error: bool,
    unparseable: usize,
}

/// Runs sync passes for one configured target.
#[derive(Debug)]
pub struct Synchronizer {
    config: Config,
    client: GraphClient,
    store: CommentStore,
    dispatcher: Option<ReplyDispatcher>,
}

impl Synchronizer {
    #[must_use]
    pub fn new(config: Config, client: GraphClient, store: CommentStore) -> Self {
        let dispatcher = config.reply_enabled.then(|| {
            ReplyDispatcher::new(
                client.clone(),
                config.reply_message.clone(),
                config.reply_delay,
            )
        });

        Self {
            config,
            client,
            store,
            dispatcher,
        }
    }

    /// Run one full pass over every page of the feed.
    pub async fn run_once(&self) -> RunSummary {
        let mut summary = RunSummary {
            started_at: Utc::now(),
            ..RunSummary::default()
        };

        let target_id = self.config.target.id();
        info!(target_id = %target_id, "Starting sync pass");

        match self.client.feed_url(target_id) {
            Ok(start_url) => self.walk_feed(start_url, &mut summary).await,
            Err(e) => {
                error!(error = %e, "Failed to build feed URL");
                summary.abort_reason = Some(e.to_string());
            }
        }

        summary.completed = summary.abort_reason.is_none();
        summary.finished_at = Utc::now();
        summary
    }

    async fn walk_feed(&self, start_url: String, summary: &mut RunSummary) {
        let mut pages = Paginator::new(&self.client, start_url, self.config.feed_page_delay);

        while let Some(result) = pages.next_page().await {
            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    error!(error = %e, "Failed to fetch feed page");
                    summary.abort_reason = Some(e.to_string());
                    break;
                }
            };
            summary.feed_pages += 1;
            debug!(page = summary.feed_pages, posts = page.data.len(), "Processing feed page");

            for item in page.data {
                match serde_json::from_value::<Post>(item) {
                    Ok(post) if !post.id.is_empty() => self.process_post(post, summary).await,
                    Ok(_) => {
                        warn!("Skipping post with empty id");
                        summary.unparseable_posts += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, "Skipping unparseable post");
                        summary.unparseable_posts += 1;
                    }
                }
            }
        }
    }

    /// Load, fetch, detect, reply, and save for one post.
    async fn process_post(&self, post: Post, summary: &mut RunSummary) {
        summary.posts_processed += 1;
        let post_id = post.id.clone();
        info!(post_id = %post_id, number = summary.posts_processed, "Processing post");

        let previous = self.store.load(&post_id).await;
        let known = known_ids(previous.as_ref());
        debug!(post_id = %post_id, known = known.len(), "Previously saved comments");

        let fetched = self.fetch_comments(&post_id).await;
        if fetched.walk_error {
            summary.comment_walk_errors += 1;
        }
        summary.unparseable_comments += fetched.unparseable;
        summary.comments_seen += fetched.comments.len();

        let new_comments = find_new(&fetched.comments, &known);
        summary.new_comments += new_comments.len();

        let tally = match &self.dispatcher {
            Some(dispatcher) if !new_comments.is_empty() => dispatcher.dispatch(&new_comments).await,
            Some(_) => ReplyTally::default(),
            None => {
                if !new_comments.is_empty() {
                    info!(post_id = %post_id, new = new_comments.len(), "Replies disabled, recording new comments only");
                }
                ReplyTally::default()
            }
        };
        summary.replies += tally;

        let fetched_count = fetched.comments.len();
        let previous_comments = previous.map(|s| s.comments).unwrap_or_default();
        let comments = merge_with_previous(fetched.comments, &previous_comments);
        let snapshot = PostSnapshot::new(post, comments);
        for comment in &snapshot.comments {
            summary.sentiment.record(comment);
        }

        match self.store.save(&snapshot).await {
            Ok(path) => {
                summary.snapshots_saved += 1;
                debug!(post_id = %post_id, path = %path.display(), "Saved snapshot");
            }
            Err(e) => {
                error!(post_id = %post_id, error = %e, "Failed to save snapshot");
                summary.save_failures += 1;
            }
        }

        info!(
            post_id = %post_id,
            total = fetched_count,
            new = new_comments.len(),
            replied = tally.succeeded,
            "Post done"
        );
    }

    async fn fetch_comments(&self, post_id: &str) -> FetchedComments {
        let url = match self.client.comments_url(post_id) {
            Ok(url) => url,
            Err(e) => {
                warn!(post_id = %post_id, error = %e, "Failed to build comments URL");
                return FetchedComments {
                    comments: Vec::new(),
                    walk_error: true,
                    unparseable: 0,
                };
            }
        };

        let collected = Paginator::new(&self.client, url, self.config.comment_page_delay)
            .collect_all()
            .await;

        if let Some(e) = &collected.error {
            warn!(
                post_id = %post_id,
                error = %e,
                fetched = collected.items.len(),
                "Comment walk aborted, keeping what was fetched"
            );
        }

        let mut unparseable = 0;
        let comments = collected
            .items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Comment>(item) {
                Ok(comment) => Some(comment),
                Err(e) => {
                    warn!(post_id = %post_id, error = %e, "Skipping unparseable comment");
                    unparseable += 1;
                    None
                }
            })
            .collect();

        FetchedComments {
            comments,
            walk_error: collected.error.is_some(),
            unparseable,
        }
    }
}
