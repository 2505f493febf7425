//! Day-index arithmetic.
//!
//! Aggregates are bucketed by "day index": whole days elapsed since the Unix
//! epoch in the device's reporting timezone (UTC here).

use chrono::{DateTime, Utc};

/// Days since 1970-01-01.
pub type DayIndex = u32;

const SECONDS_PER_DAY: i64 = 86_400;

/// The day index containing `time`.
pub fn day_index(time: DateTime<Utc>) -> DayIndex {
    let secs = time.timestamp();
    if secs < 0 {
        return 0;
    }
    (secs / SECONDS_PER_DAY) as DayIndex
}
