//! Anti-duplicate and rate-limit guard for outgoing replies.
//!
//! Entries are kept in an LRU ordered by last touch, so expiring old entries
//! is just popping from the cold end until the first one still in retention.

use log::{debug, info};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct ReplyGuardEntry {
    pub replied: bool,
    pub replied_at: Option<Instant>,
    touched_at: Instant,
}

pub struct ReplyGuard {
    entries: LruCache<String, ReplyGuardEntry>,
    retention: Duration,
    cooldown: Duration,
    last_post_at: Option<Instant>,
}

impl ReplyGuard {
    pub fn new(cooldown: Duration, retention: Duration, capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            retention,
            cooldown,
            last_post_at: None,
        }
    }

    /// False once `record_reply` has been called for this comment.
    pub fn should_reply(&mut self, comment_id: &str) -> bool {
        self.evict_expired();
        let now = Instant::now();
        let entry = self
            .entries
            .get_or_insert_mut(comment_id.to_string(), || ReplyGuardEntry {
                replied: false,
                replied_at: None,
                touched_at: now,
            });
        entry.touched_at = now;
        !entry.replied
    }

    pub fn record_reply(&mut self, comment_id: &str) {
        let now = Instant::now();
        self.entries.put(
            comment_id.to_string(),
            ReplyGuardEntry {
                replied: true,
                replied_at: Some(now),
                touched_at: now,
            },
        );
        self.last_post_at = Some(now);
    }

    /// Suspend for the configured cooldown. Called after every successful post.
    pub async fn enforce_cooldown(&self) {
        if self.cooldown.is_zero() {
            return;
        }
        info!("Cooling down for {:?} after reply", self.cooldown);
        tokio::time::sleep(self.cooldown).await;
    }

    pub fn entry(&self, comment_id: &str) -> Option<&ReplyGuardEntry> {
        self.entries.peek(comment_id)
    }

    pub fn last_post_at(&self) -> Option<Instant> {
        self.last_post_at
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_expired(&mut self) {
        let mut evicted = 0usize;
        while let Some((_, oldest)) = self.entries.peek_lru() {
            if oldest.touched_at.elapsed() < self.retention {
                break;
            }
            self.entries.pop_lru();
            evicted += 1;
        }
        if evicted > 0 {
            debug!("Reply guard evicted {} expired entr(ies)", evicted);
        }
    }
}

#[cfg(test)]
#[path = "tests/guard_tests.rs"]
mod tests;
