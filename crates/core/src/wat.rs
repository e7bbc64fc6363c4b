//! West Africa Time (UTC+01:00) helpers.
//!
//! The platform schedules and displays everything in WAT, which has no
//! daylight saving, so a fixed offset is exact.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, Utc};

use crate::types::Timestamp;

pub const WAT_OFFSET_SECS: i32 = 3600;

/// Seconds after midnight of the daily execution cut-off (15:59:59).
pub const DAILY_CUTOFF_SECS: i64 = 15 * 3600 + 59 * 60 + 59;

pub fn wat() -> FixedOffset {
    // 3600 is always inside the range FixedOffset accepts.
    FixedOffset::east_opt(WAT_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Convert a UTC timestamp to WAT.
pub fn to_wat(ts: Timestamp) -> DateTime<FixedOffset> {
    ts.with_timezone(&wat())
}

/// Today's execution cut-off (15:59:59 WAT) for the WAT calendar day
/// containing `now`.
pub fn daily_cutoff(now: Timestamp) -> DateTime<FixedOffset> {
    let midnight = to_wat(now).date_naive().and_time(NaiveTime::default());
    let local = midnight + Duration::seconds(DAILY_CUTOFF_SECS);
    let utc = local - Duration::seconds(i64::from(WAT_OFFSET_SECS));
    DateTime::from_naive_utc_and_offset(utc, wat())
}

/// `2026-10-19 15:59:59 WAT`
pub fn format_wat(ts: Timestamp) -> String {
    format!("{} WAT", to_wat(ts).format("%Y-%m-%d %H:%M:%S"))
}
