//! Distribution slot configuration and per-slot runtime status.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{SlotNumber, Timestamp};

/// Upper bound on configured slots per day.
pub const MAX_DISTRIBUTION_SLOTS: usize = 20;

/// One configured time-of-day slot, as stored in platform settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSlot {
    /// `HH:MM:SS`, WAT.
    pub time: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl DistributionSlot {
    pub fn time_of_day(&self) -> Result<NaiveTime, CoreError> {
        NaiveTime::parse_from_str(&self.time, "%H:%M:%S")
            .map_err(|e| CoreError::Parse(format!("slot time '{}': {e}", self.time)))
    }

    /// Label to show for slot `slot_number`.
    pub fn display_label(&self, slot_number: SlotNumber) -> String {
        match self.label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("Slot {slot_number}"),
        }
    }
}

/// Check a slot list fetched from settings.
pub fn validate_slot_config(slots: &[DistributionSlot]) -> Result<(), CoreError> {
    if slots.len() > MAX_DISTRIBUTION_SLOTS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_DISTRIBUTION_SLOTS} distribution slots are supported, got {}",
            slots.len()
        )));
    }
    for slot in slots {
        slot.time_of_day()?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotRunStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

impl SlotRunStatus {
    /// Completed and failed slots keep their historical allocation.
    pub fn is_locked(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Executing => "EXECUTING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// Server-reported state of one slot for today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState {
    pub slot_number: SlotNumber,
    pub status: SlotRunStatus,
    /// Allocation the server currently holds for this slot.
    #[serde(default)]
    pub ros_percentage: Option<f64>,
    #[serde(default)]
    pub executed_at: Option<Timestamp>,
    #[serde(default)]
    pub error: Option<String>,
}
