use regex::Regex;

use crate::types::{BotError, BotResult, CardName};

/// Pulls `[[Card Name]]` references out of a comment body.
///
/// Reddit's rich-text editor escapes brackets (`\[\[Name\]\]`), so every
/// backslash is removed before the pattern runs.
pub struct ReferenceExtractor {
    pattern: Regex,
}

impl ReferenceExtractor {
    /// `pattern` must have at least one capture group; group 1 is the name.
    pub fn new(pattern: &str) -> BotResult<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| BotError::MalformedInput(format!("reference pattern: {e}")))?;
        if pattern.captures_len() < 2 {
            return Err(BotError::MalformedInput(
                "reference pattern has no capture group".into(),
            ));
        }
        Ok(Self { pattern })
    }

    /// Raw references in order of appearance. Blank references are dropped.
    pub fn extract(&self, body: &str) -> Vec<String> {
        let unescaped = body.replace('\\', "");
        self.pattern
            .captures_iter(&unescaped)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !CardName::new(name).is_empty())
            .collect()
    }
}
