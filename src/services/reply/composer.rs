//! Reply body formatting (Reddit markdown).

use std::fmt::Write;

use crate::types::{Resolution, ResolvedCard, UnresolvedReason};

/// Concatenate one block per reference, in input order.
pub fn compose(results: &[(String, Resolution)]) -> String {
    let mut body = String::new();
    for (raw_name, resolution) in results {
        match resolution {
            Ok(card) => write_metrics(&mut body, card),
            Err(reason) => write_not_found(&mut body, raw_name, *reason),
        }
    }
    body
}

fn write_metrics(body: &mut String, card: &ResolvedCard) {
    let alsa = card
        .record
        .avg_seen
        .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
    let gih_wr = card
        .record
        .win_rate_in_hand
        .map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0));

    // Writing into a String cannot fail
    let _ = write!(
        body,
        "**{}** ({})\n- ALSA: {}\n- GIH WR: {}\n\n",
        card.display_name, card.expansion, alsa, gih_wr
    );
}

fn write_not_found(body: &mut String, raw_name: &str, reason: UnresolvedReason) {
    let what = match reason {
        UnresolvedReason::NoExpansion => "expansions",
        UnresolvedReason::NoRatingsData => "data",
    };
    let _ = write!(body, "Could not find {what} for card: {}\n\n", raw_name.trim());
}

#[cfg(test)]
#[path = "tests/composer_tests.rs"]
mod tests;
