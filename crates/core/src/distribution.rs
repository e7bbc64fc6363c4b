//! Today's distribution record and the client-side action state machine.
//!
//! The server owns every transition.  The client observes
//! [`DistributionStatus`] snapshots and may *request* a queue, modify or
//! cancel; [`validate_action`] only decides whether offering that request
//! makes sense for the last observed state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of today's distribution as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionState {
    Empty,
    Pending,
    Scheduled,
    Executing,
    Completed,
    Failed,
}

impl DistributionState {
    /// `true` once the server has finished with today's run.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Client actions that may be requested from this state.
    pub fn allowed_actions(self) -> &'static [DistributionAction] {
        match self {
            Self::Empty => &[DistributionAction::Queue],
            Self::Pending => &[DistributionAction::Modify, DistributionAction::Cancel],
            // Scheduled and later states are server-driven only.
            Self::Scheduled | Self::Executing | Self::Completed | Self::Failed => &[],
        }
    }

    /// Upper-case label used in listings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::Pending => "PENDING",
            Self::Scheduled => "SCHEDULED",
            Self::Executing => "EXECUTING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DistributionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label().to_ascii_lowercase())
    }
}

/// A transition the admin can ask the server for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionAction {
    Queue,
    Modify,
    Cancel,
}

impl fmt::Display for DistributionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Queue => "queue",
            Self::Modify => "modify",
            Self::Cancel => "cancel",
        })
    }
}

/// Check whether `action` may be requested while today's distribution is
/// in `state`.
pub fn validate_action(
    state: DistributionState,
    action: DistributionAction,
) -> Result<(), CoreError> {
    if state.allowed_actions().contains(&action) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition { state, action })
    }
}

// ---------------------------------------------------------------------------
// Server record
// ---------------------------------------------------------------------------

/// Values the admin queued for today's distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionValues {
    #[serde(default)]
    pub ros_percentage: f64,
    #[serde(default)]
    pub premium_pool_amount: f64,
    #[serde(default)]
    pub performance_pool_amount: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payout statistics for one pool in an execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    #[serde(default)]
    pub recipients: u32,
    #[serde(default)]
    pub total_distributed: f64,
    #[serde(default)]
    pub failed: u32,
}

/// Summary of the most recent execution of today's distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub status: DistributionState,
    #[serde(default)]
    pub ros: Option<PoolStats>,
    #[serde(default)]
    pub premium_pool: Option<PoolStats>,
    #[serde(default)]
    pub performance_pool: Option<PoolStats>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub executed_at: Option<Timestamp>,
}

impl ExecutionSummary {
    /// Sum of every pool's distributed amount.
    pub fn total_distributed(&self) -> f64 {
        [&self.ros, &self.premium_pool, &self.performance_pool]
            .into_iter()
            .flatten()
            .map(|p| p.total_distributed)
            .sum()
    }
}

/// Server snapshot of today's distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionStatus {
    pub status: DistributionState,
    #[serde(default)]
    pub scheduled_for: Option<Timestamp>,
    #[serde(default)]
    pub values: Option<DistributionValues>,
    #[serde(default)]
    pub last_execution: Option<ExecutionSummary>,
}

impl DistributionStatus {
    /// Snapshot for a day with nothing queued.
    pub fn empty() -> Self {
        Self {
            status: DistributionState::Empty,
            scheduled_for: None,
            values: None,
            last_execution: None,
        }
    }

    /// Convenience for [`validate_action`] against this snapshot.
    pub fn validate_action(&self, action: DistributionAction) -> Result<(), CoreError> {
        validate_action(self.status, action)
    }
}
