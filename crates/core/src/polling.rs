//! Poll interval selection for today's distribution status.
//!
//! The poller is modelled as a small finite-state machine: every fetched
//! snapshot maps to a [`PollPhase`], and each phase has a fixed interval.

use std::time::Duration;

use crate::distribution::{DistributionState, DistributionStatus};
use crate::types::Timestamp;

/// Interval used while a run is executing or about to start.
pub const FAST_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Interval used in every other phase.
pub const BASELINE_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// A pending run scheduled within this many seconds counts as imminent.
pub const IMMINENT_WINDOW_SECS: i64 = 10 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Nothing time-sensitive is going on.
    Baseline,
    /// Pending and due within [`IMMINENT_WINDOW_SECS`].
    Imminent,
    /// The server is executing the run.
    Executing,
}

impl PollPhase {
    /// Derive the phase from the last observed snapshot.
    ///
    /// `None` (nothing fetched yet, or only failures so far) polls at the
    /// baseline rate.
    pub fn from_status(status: Option<&DistributionStatus>, now: Timestamp) -> Self {
        let Some(status) = status else {
            return Self::Baseline;
        };

        match status.status {
            DistributionState::Executing => Self::Executing,
            DistributionState::Pending => match status.scheduled_for {
                Some(at) if (at - now).num_seconds() <= IMMINENT_WINDOW_SECS => Self::Imminent,
                _ => Self::Baseline,
            },
            _ => Self::Baseline,
        }
    }

    pub fn interval(self) -> Duration {
        match self {
            Self::Executing | Self::Imminent => FAST_POLL_INTERVAL,
            Self::Baseline => BASELINE_POLL_INTERVAL,
        }
    }
}

/// Interval to wait before the next fetch.
pub fn poll_interval(status: Option<&DistributionStatus>, now: Timestamp) -> Duration {
    PollPhase::from_status(status, now).interval()
}
