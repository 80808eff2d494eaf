//! Per-expansion ratings tables with a staleness bound.
//!
//! Tables are immutable once built. A refresh builds a new `Arc<RatingsTable>`
//! and swaps it into the map, so a failed or empty fetch can never clobber a
//! table that was good before.

use arc_swap::ArcSwap;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::services::matching::best_match;
use crate::services::sources::{RatingRow, RatingsQuery, RatingsSource};
use crate::types::{BotError, BotResult, CardName, CardRecord};

/// Ratings for one expansion, keyed by normalized display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingsTable {
    pub expansion: String,
    records: HashMap<CardName, CardRecord>,
    fetched_at: Option<Instant>,
}

impl RatingsTable {
    pub fn from_rows(expansion: &str, rows: Vec<RatingRow>) -> Self {
        let records = rows
            .into_iter()
            .map(|row| {
                let key = CardName::new(&row.name);
                let record = CardRecord {
                    display_name: row.name,
                    avg_seen: row.avg_seen,
                    win_rate_in_hand: row.ever_drawn_win_rate,
                    color: row.color,
                    rarity: row.rarity,
                };
                (key, record)
            })
            .filter(|(key, _)| !key.is_empty())
            .collect();

        Self {
            expansion: expansion.to_string(),
            records,
            fetched_at: Some(Instant::now()),
        }
    }

    pub fn empty(expansion: &str) -> Self {
        Self {
            expansion: expansion.to_string(),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.is_none_or(|at| at.elapsed() >= ttl)
    }

    /// Exact key, then the best fuzzy key at or above `threshold`.
    pub fn find(&self, name: &CardName, threshold: f64) -> Option<&CardRecord> {
        if let Some(record) = self.records.get(name) {
            return Some(record);
        }
        let keys = self.records.keys().map(CardName::as_str);
        let best = best_match(name.as_str(), keys, threshold)?;
        self.records.get(&CardName::new(best))
    }
}

#[derive(Debug, Clone)]
pub struct RatingsSettings {
    pub format: String,
    pub start_date: Option<String>,
    pub ttl: Duration,
}

pub struct RatingsCache {
    source: Arc<dyn RatingsSource>,
    settings: RatingsSettings,
    tables: ArcSwap<HashMap<String, Arc<RatingsTable>>>,
}

impl RatingsCache {
    pub fn new(source: Arc<dyn RatingsSource>, settings: RatingsSettings) -> Self {
        Self {
            source,
            settings,
            tables: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Cached table for `expansion` without triggering a fetch.
    pub fn cached(&self, expansion: &str) -> Option<Arc<RatingsTable>> {
        self.tables.load().get(expansion).cloned()
    }

    /// Fresh-enough table for `expansion`, fetching when stale or missing.
    ///
    /// When the fetch fails the stale copy is served; an empty table is
    /// returned only if nothing was ever cached.
    pub async fn get(&self, expansion: &str) -> Arc<RatingsTable> {
        let cached = self.cached(expansion);
        if let Some(table) = &cached {
            if !table.is_stale(self.settings.ttl) {
                debug!("Ratings cache hit for {}", expansion);
                return table.clone();
            }
        }

        match self.fetch(expansion).await {
            Ok(table) => {
                let table = Arc::new(table);
                self.store(expansion, table.clone());
                table
            }
            Err(e) => {
                warn!("Ratings refresh for {} failed: {e}", expansion);
                cached.unwrap_or_else(|| Arc::new(RatingsTable::empty(expansion)))
            }
        }
    }

    /// One request to the provider. Never touches the cache.
    ///
    /// An empty result counts as a failure so it cannot replace real data.
    pub async fn fetch(&self, expansion: &str) -> BotResult<RatingsTable> {
        let query = RatingsQuery {
            expansion: expansion.to_string(),
            format: self.settings.format.clone(),
            start_date: self.settings.start_date.clone(),
        };

        let rows = self.source.fetch_ratings(&query).await?;
        let table = RatingsTable::from_rows(expansion, rows);
        if table.is_empty() {
            return Err(BotError::Fetch(format!(
                "no {} ratings for {}",
                self.settings.format, expansion
            )));
        }

        info!(
            "Fetched {} {} rating(s) for {}",
            table.len(),
            self.settings.format,
            expansion
        );
        Ok(table)
    }

    fn store(&self, expansion: &str, table: Arc<RatingsTable>) {
        self.tables.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(expansion.to_string(), table.clone());
            next
        });
    }
}

#[cfg(test)]
#[path = "tests/ratings_cache_tests.rs"]
mod tests;
