use std::fmt;

use thiserror::Error;

/// Normalized card-name key: trimmed and lower-cased.
///
/// Every lookup goes through this type, so raw user input is never compared
/// against index or ratings keys directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardName(String);

impl CardName {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Draft statistics for one card in one expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord {
    /// Name as the ratings provider spells it (original casing).
    pub display_name: String,
    /// Average pick position the card was seen at (ALSA).
    pub avg_seen: Option<f64>,
    /// Games-in-hand win rate in `0.0..=1.0` (GIH WR).
    pub win_rate_in_hand: Option<f64>,
    pub color: String,
    pub rarity: String,
}

/// A reference that resolved to an expansion and a ratings record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCard {
    pub display_name: String,
    pub expansion: String,
    pub record: CardRecord,
}

/// Why a reference could not be resolved. Rendered into the reply, never logged
/// as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnresolvedReason {
    #[error("no expansion lists this card")]
    NoExpansion,
    #[error("no ratings data for this card")]
    NoRatingsData,
}

pub type Resolution = Result<ResolvedCard, UnresolvedReason>;
