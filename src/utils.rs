use chrono::{DateTime, Utc};

/// Hours billed per month for on-demand resources
pub const HOURS_PER_MONTH: f64 = 730.0;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Round a dollar amount to cents
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GIB
}

/// Human-readable byte size (`1.50 GB`)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Whole days elapsed since `created`, truncated toward zero.
///
/// Snapshot age compares whole days only: a snapshot 90 days and 23 hours
/// old is 90 days old and is not past a 90-day limit.
pub fn age_in_days(created: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(created).num_days()
}

pub fn format_currency(amount: f64) -> String {
    format!("${:.2}", amount)
}
