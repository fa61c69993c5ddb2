//! Age helpers shared by the time-based cleanup rules.

use std::time::{Duration, SystemTime};

use dustpan_core::FileRecord;

/// Seconds in one day.
pub const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// `days` whole days as a duration.
pub const fn days(days: u64) -> Duration {
    Duration::from_secs(days * 24 * 60 * 60)
}

/// Check if a record was last modified more than `threshold` before
/// `reference`. Records without a modification time never qualify.
pub fn is_older_than(record: &FileRecord, reference: SystemTime, threshold: Duration) -> bool {
    record
        .age_at(reference)
        .is_ok_and(|age| age > threshold)
}

/// Format a duration as a human-readable string.
pub fn format_age(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < 86400 {
        format!("{} hours", secs / 3600)
    } else if secs < 2592000 {
        format!("{} days", secs / 86400)
    } else if secs < 31536000 {
        format!("{} months", secs / 2592000)
    } else {
        format!("{:.1} years", secs as f64 / 31536000.0)
    }
}
