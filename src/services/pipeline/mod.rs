//! Per-comment orchestration.
//!
//! Stages for one comment:
//! 1. Filter: skip the bot's own comments
//! 2. Extract `[[…]]` references (none → skip, resolver never runs)
//! 3. Resolve each reference independently
//! 4. Compose one reply body
//! 5. Guard: local de-dup, then a remote check for an existing bot reply
//! 6. Post, record, cool down
//!
//! Each stage hands a typed result to the next; `run` turns any error into a
//! log line and moves on to the next comment.

pub mod extractor;

use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::services::config::EngineConfig;
use crate::services::index::ExpansionIndex;
use crate::services::ratings::RatingsCache;
use crate::services::reply::{compose, ReplyGuard};
use crate::services::resolver::NameResolver;
use crate::services::sources::{CardSearchSource, CommentStream, ReplyPoster};
use crate::types::{BotResult, IncomingComment};

pub use extractor::ReferenceExtractor;

/// Terminal state of one processed comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOutcome {
    SkippedSelfAuthored,
    SkippedNoReferences,
    SkippedAlreadyReplied,
    Posted { references: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub received: usize,
    pub posted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Remote collaborators the pipeline talks to.
pub struct PipelineDeps {
    pub search: Arc<dyn CardSearchSource>,
    pub ratings: Arc<RatingsCache>,
    pub poster: Arc<dyn ReplyPoster>,
}

pub struct CommentPipeline {
    bot_username: String,
    supported_expansions: Vec<String>,
    index: Arc<ExpansionIndex>,
    search: Arc<dyn CardSearchSource>,
    resolver: NameResolver,
    extractor: ReferenceExtractor,
    guard: ReplyGuard,
    poster: Arc<dyn ReplyPoster>,
}

impl CommentPipeline {
    pub fn new(
        config: &EngineConfig,
        bot_username: &str,
        index: Arc<ExpansionIndex>,
        deps: PipelineDeps,
    ) -> BotResult<Self> {
        let resolver = NameResolver::new(
            index.clone(),
            deps.ratings,
            config.supported_expansions.clone(),
            config.similarity_threshold,
        );

        Ok(Self {
            bot_username: bot_username.to_string(),
            supported_expansions: config.supported_expansions.clone(),
            index,
            search: deps.search,
            resolver,
            extractor: ReferenceExtractor::new(&config.reference_pattern)?,
            guard: ReplyGuard::new(
                config.reply_cooldown,
                config.guard_retention,
                config.guard_capacity,
            ),
            poster: deps.poster,
        })
    }

    pub fn guard(&self) -> &ReplyGuard {
        &self.guard
    }

    /// Rebuild the expansion index if its staleness bound has passed and no
    /// failed rebuild is still backing off. Failures are logged; the
    /// previous snapshot keeps serving.
    pub async fn refresh_index_if_stale(&self) {
        if !self.index.needs_refresh() {
            return;
        }
        info!(
            "Rebuilding card-expansion index for {} expansion(s)",
            self.supported_expansions.len()
        );
        if let Err(e) = self
            .index
            .refresh(self.search.as_ref(), &self.supported_expansions)
            .await
        {
            warn!("Card-expansion index rebuild failed: {e}");
        }
    }

    pub async fn process(&mut self, comment: &IncomingComment) -> BotResult<CommentOutcome> {
        if comment.is_authored_by(&self.bot_username) {
            return Ok(CommentOutcome::SkippedSelfAuthored);
        }

        self.refresh_index_if_stale().await;

        let references = self.extractor.extract(&comment.body);
        if references.is_empty() {
            debug!("No matches found in comment {}", comment.id);
            return Ok(CommentOutcome::SkippedNoReferences);
        }

        let mut results = Vec::with_capacity(references.len());
        for reference in references {
            let resolution = self.resolver.resolve(&reference).await;
            results.push((reference, resolution));
        }
        let body = compose(&results);

        if !self.guard.should_reply(&comment.id) {
            debug!("Already replied to comment {}", comment.id);
            return Ok(CommentOutcome::SkippedAlreadyReplied);
        }
        if self.poster.has_self_reply(comment).await? {
            info!("Found an existing reply under comment {}", comment.id);
            self.guard.record_reply(&comment.id);
            return Ok(CommentOutcome::SkippedAlreadyReplied);
        }

        self.poster.post_reply(comment, &body).await?;
        self.guard.record_reply(&comment.id);
        info!(
            "Replied to comment {} ({} reference(s))",
            comment.id,
            results.len()
        );
        self.guard.enforce_cooldown().await;

        Ok(CommentOutcome::Posted {
            references: results.len(),
        })
    }

    /// Drain `stream`, one comment at a time. Returns when the stream ends.
    pub async fn run(&mut self, stream: &mut dyn CommentStream) -> PipelineStats {
        let mut stats = PipelineStats::default();

        while let Some(event) = stream.next_comment().await {
            stats.received += 1;
            let comment = match event {
                Ok(comment) => comment,
                Err(e) => {
                    warn!("Skipping unreadable comment event: {e}");
                    stats.failed += 1;
                    continue;
                }
            };

            match self.process(&comment).await {
                Ok(CommentOutcome::Posted { .. }) => stats.posted += 1,
                Ok(_) => stats.skipped += 1,
                Err(e) => {
                    error!("Error processing comment {}: {e}", comment.id);
                    stats.failed += 1;
                }
            }
        }

        info!(
            "Comment stream ended: {} received, {} posted, {} skipped, {} failed",
            stats.received, stats.posted, stats.skipped, stats.failed
        );
        stats
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
