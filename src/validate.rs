//! Score-string validation
//!
//! `validate_score` is the single gate for untrusted score text; it is
//! applied to menu choices and manual entry alike.

/// Highest goal count accepted in either half of a score string.
const MAX_GOALS: u32 = 20;

/// Parse a `"H-A"` score string into goal counts.
///
/// Accepts surrounding whitespace on either half and rejects anything
/// that is not exactly two non-negative integers joined by `-`. The
/// goal ceiling is a validation rule, not a parsing rule, so re-scoring
/// a stored value still parses here.
pub fn parse_score(s: &str) -> Option<(u32, u32)> {
    let (home, away) = s.split_once('-')?;
    let home = home.trim();
    let away = away.trim();
    if home.is_empty() || away.is_empty() {
        return None;
    }
    // u32::parse alone would accept a leading `+`
    if !home.bytes().all(|b| b.is_ascii_digit()) || !away.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((home.parse().ok()?, away.parse().ok()?))
}

/// Is `s` a well-formed, in-range score submission?
///
/// Rules, in order: total length within `max_len`, two non-empty numeric
/// halves joined by `-`, both non-negative, both within the goal
/// ceiling. Never panics on any input.
pub fn validate_score(s: &str, max_len: usize) -> bool {
    if s.len() > max_len {
        return false;
    }
    match parse_score(s) {
        Some((home, away)) => home <= MAX_GOALS && away <= MAX_GOALS,
        None => false,
    }
}
