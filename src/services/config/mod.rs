//! Environment-driven configuration.
//!
//! `from_env` reads the process environment (after `.env` has been loaded by
//! the binary); `from_lookup` takes any key → value source so tests do not have
//! to touch global state.

pub mod models;

pub use models::*;

use chrono::NaiveDate;
use regex::Regex;
use std::str::FromStr;
use std::time::Duration;

use crate::types::{BotError, BotResult};

impl BotConfig {
    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| BotError::Config(format!("{key} is not set")))
        };

        let reddit = RedditCredentials {
            client_id: required("REDDIT_CLIENT_ID")?,
            client_secret: required("REDDIT_CLIENT_SECRET")?,
            user_agent: required("REDDIT_USER_AGENT")?,
            username: required("REDDIT_USERNAME")?,
            password: required("REDDIT_PASSWORD")?,
        };

        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            supported_expansions: match get("SUPPORTED_EXPANSIONS") {
                Some(raw) => parse_expansions(&raw)?,
                None => defaults.supported_expansions,
            },
            ratings_format: get("RATINGS_FORMAT").unwrap_or(defaults.ratings_format),
            ratings_start_date: get("RATINGS_START_DATE")
                .map(|raw| validate_start_date(&raw))
                .transpose()?,
            index_ttl: secs_or(get("INDEX_TTL_SECS"), "INDEX_TTL_SECS", defaults.index_ttl)?,
            index_retry: secs_or(
                get("INDEX_RETRY_SECS"),
                "INDEX_RETRY_SECS",
                defaults.index_retry,
            )?,
            ratings_ttl: secs_or(
                get("RATINGS_TTL_SECS"),
                "RATINGS_TTL_SECS",
                defaults.ratings_ttl,
            )?,
            similarity_threshold: match get("SIMILARITY_THRESHOLD") {
                Some(raw) => parse_threshold(&raw)?,
                None => defaults.similarity_threshold,
            },
            reply_cooldown: secs_or(
                get("REPLY_COOLDOWN_SECS"),
                "REPLY_COOLDOWN_SECS",
                defaults.reply_cooldown,
            )?,
            reference_pattern: match get("REFERENCE_PATTERN") {
                Some(raw) => validate_pattern(&raw)?,
                None => defaults.reference_pattern,
            },
            guard_retention: secs_or(
                get("GUARD_RETENTION_SECS"),
                "GUARD_RETENTION_SECS",
                defaults.guard_retention,
            )?,
            guard_capacity: defaults.guard_capacity,
        };

        Ok(BotConfig {
            reddit,
            subreddit: get("SUBREDDIT").unwrap_or_else(|| "17lands".into()),
            poll_interval: secs_or(
                get("POLL_INTERVAL_SECS"),
                "POLL_INTERVAL_SECS",
                Duration::from_secs(30),
            )?,
            engine,
        })
    }
}

fn parse_number<T: FromStr>(raw: &str, key: &str) -> BotResult<T> {
    raw.parse()
        .map_err(|_| BotError::Config(format!("{key} is not a valid number: {raw:?}")))
}

fn secs_or(raw: Option<String>, key: &str, default: Duration) -> BotResult<Duration> {
    match raw {
        Some(raw) => parse_number::<u64>(&raw, key).map(Duration::from_secs),
        None => Ok(default),
    }
}

/// Comma-separated, order-preserving, upper-cased, deduplicated.
fn parse_expansions(raw: &str) -> BotResult<Vec<String>> {
    let mut codes: Vec<String> = Vec::new();
    for code in raw.split(',').map(|c| c.trim().to_uppercase()) {
        if !code.is_empty() && !codes.contains(&code) {
            codes.push(code);
        }
    }
    if codes.is_empty() {
        return Err(BotError::Config(
            "SUPPORTED_EXPANSIONS lists no expansion codes".into(),
        ));
    }
    Ok(codes)
}

fn parse_threshold(raw: &str) -> BotResult<f64> {
    let value: f64 = parse_number(raw, "SIMILARITY_THRESHOLD")?;
    if !(0.0..=1.0).contains(&value) {
        return Err(BotError::Config(format!(
            "SIMILARITY_THRESHOLD must be within 0..=1, got {value}"
        )));
    }
    Ok(value)
}

fn validate_start_date(raw: &str) -> BotResult<String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|e| BotError::Config(format!("RATINGS_START_DATE {raw:?}: {e}")))
}

fn validate_pattern(raw: &str) -> BotResult<String> {
    let re = Regex::new(raw)
        .map_err(|e| BotError::Config(format!("REFERENCE_PATTERN does not compile: {e}")))?;
    if re.captures_len() < 2 {
        return Err(BotError::Config(
            "REFERENCE_PATTERN needs a capture group for the card name".into(),
        ));
    }
    Ok(raw.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
