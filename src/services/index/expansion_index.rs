//! Card name → expansion index.
//!
//! **Refresh:**
//! 1. For each allow-listed expansion, page through the card search.
//! 2. A failed page drops that expansion's fresh pages and carries forward
//!    whatever the previous snapshot knew about it.
//! 3. The finished map is published with one `ArcSwap::store`; readers hold
//!    either the old or the new snapshot, never a half-built one.
//! 4. Only a rebuild where every expansion succeeded resets the staleness
//!    clock. After a partial or total failure the index stays stale and is
//!    retried once `retry_interval` has passed.
//!
//! **Lookup:** exact normalized key first, then a single best fuzzy candidate
//! at or above the similarity threshold.

use arc_swap::{ArcSwap, ArcSwapOption};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::services::matching::best_match;
use crate::services::sources::CardSearchSource;
use crate::types::{BotError, BotResult, CardName};

/// Upper bound on pages per expansion in case a source never stops reporting
/// `has_more`.
const MAX_PAGES: usize = 200;

const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Immutable published state of the index.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    entries: HashMap<CardName, Vec<String>>,
    built_at: Option<Instant>,
}

impl IndexSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &CardName) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }
}

/// Result of a successful index lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    /// Key that matched; differs from the query on a fuzzy hit.
    pub key: CardName,
    /// Expansion codes in source order.
    pub expansions: Vec<String>,
    pub exact: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshSummary {
    pub cards: usize,
    pub failed_expansions: Vec<String>,
}

pub struct ExpansionIndex {
    snapshot: ArcSwap<IndexSnapshot>,
    last_failure: ArcSwapOption<Instant>,
    ttl: Duration,
    retry_interval: Duration,
    threshold: f64,
}

impl ExpansionIndex {
    pub fn new(ttl: Duration, threshold: f64) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(IndexSnapshot::default()),
            last_failure: ArcSwapOption::empty(),
            ttl,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            threshold,
        }
    }

    /// Minimum wait between rebuilds that did not fully succeed.
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.snapshot.load_full()
    }

    /// True until the first fully successful rebuild, then once `ttl` has
    /// elapsed since the latest one.
    pub fn is_stale(&self) -> bool {
        match self.snapshot.load().built_at {
            Some(built_at) => built_at.elapsed() >= self.ttl,
            None => true,
        }
    }

    /// Stale, and not inside the back-off window of a failed rebuild.
    pub fn needs_refresh(&self) -> bool {
        let last_failure = self.last_failure.load();
        self.is_stale()
            && last_failure
                .as_deref()
                .is_none_or(|at| at.elapsed() >= self.retry_interval)
    }

    pub fn lookup(&self, name: &CardName) -> Option<IndexMatch> {
        let snapshot = self.snapshot.load();

        if let Some(expansions) = snapshot.entries.get(name) {
            return Some(IndexMatch {
                key: name.clone(),
                expansions: expansions.clone(),
                exact: true,
            });
        }

        let keys = snapshot.entries.keys().map(CardName::as_str);
        let best = best_match(name.as_str(), keys, self.threshold)?;
        let key = CardName::new(best);
        let expansions = snapshot.entries.get(&key)?.clone();
        Some(IndexMatch {
            key,
            expansions,
            exact: false,
        })
    }

    /// Rebuild from `source` and publish the result.
    ///
    /// Fails only when no expansion produced data, fresh or carried forward;
    /// the previous snapshot then stays in place.
    pub async fn refresh(
        &self,
        source: &dyn CardSearchSource,
        expansions: &[String],
    ) -> BotResult<RefreshSummary> {
        let previous = self.snapshot.load_full();
        let mut entries: HashMap<CardName, Vec<String>> = HashMap::new();
        let mut summary = RefreshSummary::default();
        let mut contributed = false;

        for code in expansions {
            match fetch_expansion(source, code).await {
                Ok(names) => {
                    info!("Indexed {} card(s) for {}", names.len(), code);
                    contributed = true;
                    for name in names {
                        associate(&mut entries, name, code);
                    }
                }
                Err(e) => {
                    warn!("Skipping {} in index rebuild: {e}", code);
                    summary.failed_expansions.push(code.clone());
                    for (name, codes) in &previous.entries {
                        if codes.contains(code) {
                            contributed = true;
                            associate(&mut entries, name.clone(), code);
                        }
                    }
                }
            }
        }

        if !contributed {
            self.last_failure.store(Some(Arc::new(Instant::now())));
            return Err(BotError::Fetch(format!(
                "index rebuild produced no data ({} expansion(s) failed)",
                summary.failed_expansions.len()
            )));
        }

        summary.cards = entries.len();
        let built_at = if summary.failed_expansions.is_empty() {
            self.last_failure.store(None);
            Some(Instant::now())
        } else {
            self.last_failure.store(Some(Arc::new(Instant::now())));
            previous.built_at
        };
        self.snapshot.store(Arc::new(IndexSnapshot { entries, built_at }));
        info!(
            "Built card-expansion index: {} card(s), {} failed expansion(s)",
            summary.cards,
            summary.failed_expansions.len()
        );
        Ok(summary)
    }
}

fn associate(entries: &mut HashMap<CardName, Vec<String>>, name: CardName, code: &str) {
    let codes = entries.entry(name).or_default();
    if !codes.iter().any(|c| c == code) {
        codes.push(code.to_string());
    }
}

/// All card names of one expansion, or an error if any page fails.
async fn fetch_expansion(source: &dyn CardSearchSource, code: &str) -> BotResult<Vec<CardName>> {
    let mut names = Vec::new();
    let mut token: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let page = source.search_page(code, token.as_deref()).await?;
        names.extend(
            page.cards
                .iter()
                .map(|card| CardName::new(&card.name))
                .filter(|name| !name.is_empty()),
        );

        match (page.has_more, page.next_page_token) {
            (true, Some(next)) => token = Some(next),
            (true, None) => {
                warn!("{code}: source reported more pages without a token");
                return Ok(names);
            }
            (false, _) => return Ok(names),
        }
    }

    Err(BotError::Fetch(format!(
        "{code}: gave up after {MAX_PAGES} pages"
    )))
}

#[cfg(test)]
#[path = "tests/expansion_index_tests.rs"]
mod tests;
