//! The retention sweep: fetch, decide, delete, log.
//!
//! Posts are processed strictly in the order the API returned them. Each
//! delete is awaited before the next post is evaluated, so the log reads in
//! timeline order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::{TimelineApi, TimelineRequest};
use crate::error::Result;
use crate::post::Post;
use crate::retention::{
    Decision, KEEP_PREVIEW_CHARS, RetentionPolicy, round_to_minute, truncate_chars,
};

/// What happened to a post after its decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeleteStatus {
    /// Skipped or kept, nothing to delete
    NotRequested,
    /// Would have been deleted
    DryRun,
    /// Delete call succeeded
    Deleted,
    /// Delete call failed
    Failed(String),
}

/// Result for a single post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOutcome {
    pub post_id: u64,
    pub decision: Decision,
    pub delete: DeleteStatus,
}

/// Summary of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Per-post outcomes in timeline order
    pub outcomes: Vec<PostOutcome>,
}

impl SweepReport {
    /// Posts created before the epoch
    pub fn skipped(&self) -> usize {
        self.count(|o| o.decision == Decision::SkipPreEpoch)
    }

    /// Posts actually deleted
    pub fn deleted(&self) -> usize {
        self.count(|o| o.delete == DeleteStatus::Deleted)
    }

    /// Posts inside the retention window
    pub fn kept(&self) -> usize {
        self.count(|o| o.decision == Decision::Keep)
    }

    /// Posts that should have been deleted but were not
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o.delete, DeleteStatus::Failed(_)))
    }

    /// Posts judged stale, whether or not the delete went through
    pub fn stale(&self) -> usize {
        self.count(|o| o.decision.is_delete())
    }

    fn count(&self, predicate: impl Fn(&PostOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(*o)).count()
    }
}

/// Runs a sweep against a [`TimelineApi`]
pub struct Sweeper {
    api: Arc<dyn TimelineApi>,
    policy: RetentionPolicy,
    request: TimelineRequest,
    dry_run: bool,
}

impl Sweeper {
    pub fn new(api: Arc<dyn TimelineApi>, policy: RetentionPolicy) -> Self {
        Self {
            api,
            policy,
            request: TimelineRequest::default(),
            dry_run: false,
        }
    }

    /// Evaluate and log without deleting anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn page_size(mut self, count: u32) -> Self {
        self.request.count = count;
        self
    }

    pub fn include_reposts(mut self, include: bool) -> Self {
        self.request.include_reposts = include;
        self
    }

    /// Run a sweep against the current time.
    pub async fn run(&self) -> Result<SweepReport> {
        self.run_at(Utc::now()).await
    }

    /// Run a sweep judging every post against `now`.
    ///
    /// # Errors
    ///
    /// Fails only if the timeline cannot be fetched. Delete failures are
    /// logged and recorded in the report.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let posts = self.api.fetch_recent_posts(&self.request).await?;

        info!(count = posts.len(), dry_run = self.dry_run, "Fetched timeline");

        let mut report = SweepReport::default();
        for post in &posts {
            let decision = self.policy.decide(post, now);
            let delete = self.apply(post, decision).await;
            report.outcomes.push(PostOutcome {
                post_id: post.id,
                decision,
                delete,
            });
        }

        info!(
            skipped = report.skipped(),
            deleted = report.deleted(),
            kept = report.kept(),
            failed = report.failed(),
            "No more posts to delete."
        );

        Ok(report)
    }

    async fn apply(&self, post: &Post, decision: Decision) -> DeleteStatus {
        match decision {
            Decision::SkipPreEpoch => {
                info!(post = %post.text, epoch = %self.policy.epoch, "Post before the epoch");
                DeleteStatus::NotRequested
            }
            Decision::Delete { age } => {
                let status = if self.dry_run {
                    DeleteStatus::DryRun
                } else {
                    match self.api.delete_post(post.id).await {
                        Ok(()) => DeleteStatus::Deleted,
                        Err(e) => {
                            warn!(post_id = post.id, error = %e, "Failed to delete!");
                            DeleteStatus::Failed(e.to_string())
                        }
                    }
                };

                info!(
                    age = %humantime::format_duration(round_to_minute(age)),
                    post = %post.text,
                    "DELETED"
                );
                status
            }
            Decision::Keep => {
                info!(
                    post = %truncate_chars(&post.text, KEEP_PREVIEW_CHARS),
                    max_age = %humantime::format_duration(self.policy.max_age),
                    "Post within save window."
                );
                DeleteStatus::NotRequested
            }
        }
    }
}
