use crate::distribution::{DistributionAction, DistributionState};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Slot {slot_number} is locked and cannot be edited")]
    Locked { slot_number: u32 },

    #[error("Slot {0} is not configured")]
    UnknownSlot(u32),

    #[error("Cannot {action} a distribution that is {state}")]
    InvalidTransition {
        state: DistributionState,
        action: DistributionAction,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}
