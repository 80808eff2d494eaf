//! Approximate card-name matching.
//!
//! Both the expansion index and the ratings tables fall back to this when an
//! exact normalized key is missing. Scores come from `strsim`'s normalized
//! Levenshtein distance, so `1.0` means identical and `0.0` means nothing in
//! common.

/// Similarity of two already-normalized names in `0.0..=1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Pick the single best candidate scoring at least `threshold`.
///
/// Ties go to the lexicographically smallest candidate so the result does not
/// depend on hash-map iteration order.
pub fn best_match<'a, I>(target: &str, candidates: I, threshold: f64) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(f64, &'a str)> = None;

    for candidate in candidates {
        let score = similarity(target, candidate);
        if score < threshold {
            continue;
        }
        best = match best {
            Some((best_score, best_key))
                if best_score > score || (best_score == score && best_key <= candidate) =>
            {
                Some((best_score, best_key))
            }
            _ => Some((score, candidate)),
        };
    }

    best.map(|(_, key)| key)
}

#[cfg(test)]
#[path = "tests/similarity_tests.rs"]
mod tests;
