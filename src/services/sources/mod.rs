//! Seams between the resolution engine and the outside world.
//!
//! The index, ratings cache and pipeline only ever talk to these traits; the
//! HTTP-backed implementations live in the submodules and the tests plug in
//! in-memory fakes.

pub mod http;
pub mod reddit;
pub mod scryfall;
pub mod seventeen_lands;

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{BotResult, IncomingComment};

/// One page of a card-database search for a single expansion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardSearchPage {
    #[serde(rename = "data", default)]
    pub cards: Vec<CardSearchEntry>,
    #[serde(default)]
    pub has_more: bool,
    /// Opaque continuation token; Scryfall hands out the next page's URL.
    #[serde(rename = "next_page")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardSearchEntry {
    pub name: String,
}

/// One row of the ratings provider's per-expansion export.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingRow {
    pub name: String,
    #[serde(default)]
    pub avg_seen: Option<f64>,
    #[serde(default)]
    pub ever_drawn_win_rate: Option<f64>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub rarity: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingsQuery {
    pub expansion: String,
    pub format: String,
    /// `YYYY-MM-DD`; provider default window when absent.
    pub start_date: Option<String>,
}

#[async_trait]
pub trait CardSearchSource: Send + Sync {
    /// Fetch one page of cards for `expansion`. `page_token` is `None` for the
    /// first page and the previous page's `next_page_token` afterwards.
    async fn search_page(
        &self,
        expansion: &str,
        page_token: Option<&str>,
    ) -> BotResult<CardSearchPage>;
}

#[async_trait]
pub trait RatingsSource: Send + Sync {
    async fn fetch_ratings(&self, query: &RatingsQuery) -> BotResult<Vec<RatingRow>>;
}

/// Lazy sequence of comment events. `None` means the stream is exhausted.
#[async_trait]
pub trait CommentStream: Send {
    async fn next_comment(&mut self) -> Option<BotResult<IncomingComment>>;
}

#[async_trait]
pub trait ReplyPoster: Send + Sync {
    /// Ask the platform (not local state) whether the bot already replied.
    async fn has_self_reply(&self, comment: &IncomingComment) -> BotResult<bool>;

    async fn post_reply(&self, comment: &IncomingComment, body: &str) -> BotResult<()>;
}
