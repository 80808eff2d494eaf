//! In-memory stand-ins for the remote sources, shared by the unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use crate::services::sources::{
    CardSearchEntry, CardSearchPage, CardSearchSource, CommentStream, RatingRow, RatingsQuery,
    RatingsSource, ReplyPoster,
};
use crate::types::{BotError, BotResult, IncomingComment};

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn rating(name: &str, avg_seen: f64, win_rate: f64) -> RatingRow {
    RatingRow {
        name: name.to_string(),
        avg_seen: Some(avg_seen),
        ever_drawn_win_rate: Some(win_rate),
        color: "R".to_string(),
        rarity: "common".to_string(),
    }
}

pub fn comment(id: &str, author: &str, body: &str) -> IncomingComment {
    IncomingComment {
        id: id.to_string(),
        author: Some(author.to_string()),
        body: body.to_string(),
        link_id: "t3_thread".to_string(),
    }
}

// ─── Card search ─────────────────────────────────────────────────────────────

/// Serves pre-split pages per expansion. Pages listed in `failing_pages`
/// return a fetch error instead.
#[derive(Default)]
pub struct FakeCardSearch {
    pages: Mutex<HashMap<String, Vec<Vec<String>>>>,
    failing_pages: Mutex<HashSet<(String, usize)>>,
    pub calls: AtomicUsize,
}

impl FakeCardSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(self, expansion: &str, names: &[&str]) -> Self {
        self.set_pages(expansion, &[names]);
        self
    }

    pub fn set_pages(&self, expansion: &str, pages: &[&[&str]]) {
        let pages = pages
            .iter()
            .map(|page| page.iter().map(|n| n.to_string()).collect())
            .collect();
        self.pages
            .lock()
            .unwrap()
            .insert(expansion.to_string(), pages);
    }

    pub fn fail_page(&self, expansion: &str, page: usize) {
        self.failing_pages
            .lock()
            .unwrap()
            .insert((expansion.to_string(), page));
    }

    pub fn heal(&self) {
        self.failing_pages.lock().unwrap().clear();
    }
}

#[async_trait]
impl CardSearchSource for FakeCardSearch {
    async fn search_page(
        &self,
        expansion: &str,
        page_token: Option<&str>,
    ) -> BotResult<CardSearchPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let index: usize = page_token.map_or(0, |t| t.parse().unwrap_or(0));

        if self
            .failing_pages
            .lock()
            .unwrap()
            .contains(&(expansion.to_string(), index))
        {
            return Err(BotError::Fetch(format!("{expansion} page {index}: HTTP 503")));
        }

        let pages = self.pages.lock().unwrap();
        let Some(all) = pages.get(expansion) else {
            return Err(BotError::Fetch(format!("{expansion}: HTTP 404")));
        };
        let names = all.get(index).cloned().unwrap_or_default();
        let has_more = index + 1 < all.len();
        Ok(CardSearchPage {
            cards: names
                .into_iter()
                .map(|name| CardSearchEntry { name })
                .collect(),
            has_more,
            next_page_token: has_more.then(|| (index + 1).to_string()),
        })
    }
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeRatings {
    rows: Mutex<HashMap<String, Vec<RatingRow>>>,
    failing: Mutex<HashSet<String>>,
    pub queries: Mutex<Vec<RatingsQuery>>,
}

impl FakeRatings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, expansion: &str, rows: Vec<RatingRow>) -> Self {
        self.set_rows(expansion, rows);
        self
    }

    pub fn set_rows(&self, expansion: &str, rows: Vec<RatingRow>) {
        self.rows
            .lock()
            .unwrap()
            .insert(expansion.to_string(), rows);
    }

    pub fn set_failing(&self, expansion: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(expansion.to_string());
        } else {
            set.remove(expansion);
        }
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl RatingsSource for FakeRatings {
    async fn fetch_ratings(&self, query: &RatingsQuery) -> BotResult<Vec<RatingRow>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.failing.lock().unwrap().contains(&query.expansion) {
            return Err(BotError::Fetch(format!("{}: connection reset", query.expansion)));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&query.expansion)
            .cloned()
            .unwrap_or_default())
    }
}

// ─── Replies ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakePoster {
    pub posted: Mutex<Vec<(String, String)>>,
    /// Comments the platform already shows a bot reply under.
    pub existing_replies: Mutex<HashSet<String>>,
    pub fail_posts: Mutex<bool>,
}

impl FakePoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyPoster for FakePoster {
    async fn has_self_reply(&self, comment: &IncomingComment) -> BotResult<bool> {
        Ok(self.existing_replies.lock().unwrap().contains(&comment.id))
    }

    async fn post_reply(&self, comment: &IncomingComment, body: &str) -> BotResult<()> {
        if *self.fail_posts.lock().unwrap() {
            return Err(BotError::Post("RATELIMIT: try again later".into()));
        }
        self.posted
            .lock()
            .unwrap()
            .push((comment.id.clone(), body.to_string()));
        Ok(())
    }
}

// ─── Stream ──────────────────────────────────────────────────────────────────

pub struct VecStream {
    items: VecDeque<BotResult<IncomingComment>>,
}

impl VecStream {
    pub fn new(items: Vec<BotResult<IncomingComment>>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

#[async_trait]
impl CommentStream for VecStream {
    async fn next_comment(&mut self) -> Option<BotResult<IncomingComment>> {
        self.items.pop_front()
    }
}
