//! Time-to-execution display for a pending distribution.

use serde::Serialize;

use crate::distribution::{DistributionState, DistributionStatus};
use crate::types::Timestamp;

/// Shown once the scheduled time has been reached.
pub const EXECUTING_NOW: &str = "Executing now...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum CountdownDisplay {
    /// Formatted remaining time, e.g. `"1h 30m 0s"`.
    Remaining(String),
    /// The scheduled time has passed; the server should be picking it up.
    ExecutingNow,
}

impl CountdownDisplay {
    pub fn text(&self) -> &str {
        match self {
            Self::Remaining(text) => text,
            Self::ExecutingNow => EXECUTING_NOW,
        }
    }
}

/// Format a whole number of seconds as `"Xh Ym Zs"`.
///
/// Leading zero-valued units are dropped (`45` -> `"45s"`,
/// `125` -> `"2m 5s"`); once a larger unit is shown every smaller unit is
/// shown too (`3605` -> `"1h 0m 5s"`).
pub fn format_remaining(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Display for a remaining duration.  Zero means the time has been reached.
///
/// Partial seconds round up so the display never reads "0s" early.
pub fn display_for_remaining(remaining: std::time::Duration) -> CountdownDisplay {
    if remaining.is_zero() {
        return CountdownDisplay::ExecutingNow;
    }
    let remaining_secs = remaining.as_nanos().div_ceil(1_000_000_000) as u64;
    CountdownDisplay::Remaining(format_remaining(remaining_secs))
}

/// Countdown for `status` at `now`.
///
/// Only a PENDING distribution with a `scheduledFor` time has a countdown;
/// everything else returns `None`.
pub fn countdown(status: &DistributionStatus, now: Timestamp) -> Option<CountdownDisplay> {
    if status.status != DistributionState::Pending {
        return None;
    }
    let scheduled_for = status.scheduled_for?;
    // Negative deltas fail the conversion and clamp to zero.
    let remaining = (scheduled_for - now).to_std().unwrap_or_default();
    Some(display_for_remaining(remaining))
}
