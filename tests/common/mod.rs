use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use draftstats_lib::services::sources::{
    CardSearchEntry, CardSearchPage, CardSearchSource, RatingRow, RatingsQuery, RatingsSource,
    ReplyPoster,
};
use draftstats_lib::types::{BotError, BotResult, IncomingComment};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn comment(id: &str, author: &str, body: &str) -> IncomingComment {
    IncomingComment {
        id: id.to_string(),
        author: Some(author.to_string()),
        body: body.to_string(),
        link_id: "t3_draft".to_string(),
    }
}

pub fn row(name: &str, avg_seen: f64, win_rate: f64) -> RatingRow {
    RatingRow {
        name: name.to_string(),
        avg_seen: Some(avg_seen),
        ever_drawn_win_rate: Some(win_rate),
        color: "W".to_string(),
        rarity: "uncommon".to_string(),
    }
}

/// Single-page card search keyed by expansion code.
#[derive(Default)]
pub struct CardCatalog {
    cards: HashMap<String, Vec<String>>,
}

impl CardCatalog {
    pub fn with(mut self, expansion: &str, names: &[&str]) -> Self {
        self.cards.insert(
            expansion.to_string(),
            names.iter().map(|n| n.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl CardSearchSource for CardCatalog {
    async fn search_page(
        &self,
        expansion: &str,
        _page_token: Option<&str>,
    ) -> BotResult<CardSearchPage> {
        let names = self
            .cards
            .get(expansion)
            .ok_or_else(|| BotError::Fetch(format!("{expansion}: HTTP 404")))?;
        Ok(CardSearchPage {
            cards: names
                .iter()
                .map(|name| CardSearchEntry { name: name.clone() })
                .collect(),
            has_more: false,
            next_page_token: None,
        })
    }
}

/// Ratings provider that can be switched offline.
#[derive(Default)]
pub struct RatingsBoard {
    rows: HashMap<String, Vec<RatingRow>>,
    pub offline: AtomicBool,
    pub requests: AtomicUsize,
}

impl RatingsBoard {
    pub fn with(mut self, expansion: &str, rows: Vec<RatingRow>) -> Self {
        self.rows.insert(expansion.to_string(), rows);
        self
    }
}

#[async_trait]
impl RatingsSource for RatingsBoard {
    async fn fetch_ratings(&self, query: &RatingsQuery) -> BotResult<Vec<RatingRow>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(BotError::Fetch("HTTP 503".into()));
        }
        Ok(self.rows.get(&query.expansion).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct RecordingPoster {
    replies: Mutex<Vec<(String, String)>>,
}

impl RecordingPoster {
    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyPoster for RecordingPoster {
    async fn has_self_reply(&self, _comment: &IncomingComment) -> BotResult<bool> {
        Ok(false)
    }

    async fn post_reply(&self, comment: &IncomingComment, body: &str) -> BotResult<()> {
        self.replies
            .lock()
            .unwrap()
            .push((comment.id.clone(), body.to_string()));
        Ok(())
    }
}
