//! Name resolution: raw reference → (expansion, ratings record).
//!
//! Both levels use the same two-step lookup: exact normalized key, then one
//! best fuzzy candidate. Across expansions the first hit in index order wins,
//! even if a later expansion would have matched more closely.

use log::debug;
use std::sync::Arc;

use crate::services::index::ExpansionIndex;
use crate::services::ratings::RatingsCache;
use crate::types::{CardName, Resolution, ResolvedCard, UnresolvedReason};

pub struct NameResolver {
    index: Arc<ExpansionIndex>,
    ratings: Arc<RatingsCache>,
    supported_expansions: Vec<String>,
    threshold: f64,
}

impl NameResolver {
    pub fn new(
        index: Arc<ExpansionIndex>,
        ratings: Arc<RatingsCache>,
        supported_expansions: Vec<String>,
        threshold: f64,
    ) -> Self {
        Self {
            index,
            ratings,
            supported_expansions,
            threshold,
        }
    }

    pub async fn resolve(&self, raw_name: &str) -> Resolution {
        let name = CardName::new(raw_name);
        let Some(hit) = self.index.lookup(&name) else {
            debug!("No expansion for {:?}", raw_name);
            return Err(UnresolvedReason::NoExpansion);
        };

        if !hit.exact {
            debug!("{:?} matched index key {:?}", raw_name, hit.key.as_str());
        }

        let candidates = hit
            .expansions
            .iter()
            .filter(|code| self.supported_expansions.contains(code));

        for code in candidates {
            let table = self.ratings.get(code).await;
            if let Some(record) = table.find(&name, self.threshold) {
                return Ok(ResolvedCard {
                    display_name: record.display_name.clone(),
                    expansion: code.clone(),
                    record: record.clone(),
                });
            }
        }

        debug!("No ratings data for {:?} in {:?}", raw_name, hit.expansions);
        Err(UnresolvedReason::NoRatingsData)
    }
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
