//! CSS duration parsing and countdown formatting.

use crate::DEFAULT_FADE;
use std::time::Duration;

/// Parse a CSS time value such as `300ms` or `0.25s`. Empty or malformed
/// values fall back to the default fade.
pub fn parse_css_duration(raw: &str) -> Duration {
    let raw = raw.trim();
    let (number, scale) = if let Some(ms) = raw.strip_suffix("ms") {
        (ms, 1.0)
    } else if let Some(s) = raw.strip_suffix('s') {
        (s, 1000.0)
    } else {
        (raw, 1.0)
    };
    match number.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => {
            Duration::from_micros((value * scale * 1000.0).round() as u64)
        }
        _ => DEFAULT_FADE,
    }
}

/// `HH:MM:SS`, prefixed with `Xd ` when at least a day remains.
/// `None` once the countdown has run out.
pub fn format_countdown(seconds_left: i64) -> Option<String> {
    if seconds_left <= 0 {
        return None;
    }
    let days = seconds_left / 86_400;
    let hours = (seconds_left % 86_400) / 3_600;
    let minutes = (seconds_left % 3_600) / 60;
    let seconds = seconds_left % 60;
    let clock = format!("{hours:02}:{minutes:02}:{seconds:02}");
    Some(if days > 0 {
        format!("{days}d {clock}")
    } else {
        clock
    })
}
