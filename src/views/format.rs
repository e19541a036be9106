//! Display formatting shared by the terminal and browser renderers.

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Parse a backend timestamp. RFC 3339 is taken as-is; a naive ISO-8601
/// timestamp (what the backend's `utcnow().isoformat()` emits) is UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().with_timezone(&Local))
}

/// Local wall-clock time, e.g. `14:03:27`. Unparsable input is shown as-is.
pub fn clock_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Local date and time, e.g. `2025-01-31 14:03:27`.
pub fn date_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Current time as an RFC 3339 string, for locally created messages.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// First `max_chars` characters of `text` followed by `...`.
pub fn preview(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}...")
}

/// A 0–10 level as a bar fill percentage, clamped to `[0, 100]`.
pub fn level_percent(level: f64) -> f64 {
    (level / 10.0 * 100.0).clamp(0.0, 100.0)
}

/// `value` with `digits` decimals, exact halves rounded away from zero
/// (`4.25` -> `4.3`). `format!` alone rounds them to even.
pub fn fixed(value: f64, digits: usize) -> String {
    let scale = 10f64.powi(digits as i32);
    let rounded = (value * scale).round() / scale;
    format!("{rounded:.digits$}")
}

/// A `[0, 1]` rate as a whole percentage label, e.g. `95%`.
pub fn rate_percent(rate: f64) -> String {
    format!("{}%", fixed(rate * 100.0, 0))
}

/// A level as the backend sent it: `7` rather than `7.0`, `6.5` kept.
pub fn level_number(level: f64) -> String {
    if level.fract() == 0.0 {
        format!("{level:.0}")
    } else {
        format!("{level}")
    }
}
