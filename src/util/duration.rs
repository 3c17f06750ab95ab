//! Humane duration parsing for task timeouts
//!
//! Accepts `<n>s`, `<n>m`, `<n>h`, compound forms such as `1h30m`,
//! and a bare number meaning seconds.

use std::time::Duration;

/// Parse `90s`, `15m`, `2h`, `1h30m` or `900`
///
/// Returns `None` for empty input, unknown units, a unit without a number,
/// or overflow.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for ch in input.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let factor = match ch {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            _ => return None,
        };
        let value: u64 = digits.parse().ok()?;
        total = total.checked_add(value.checked_mul(factor)?)?;
        digits.clear();
    }

    // Trailing digits without a unit ("1h30") are ambiguous
    if !digits.is_empty() {
        return None;
    }
    Some(Duration::from_secs(total))
}
