//! Slot allocation workflow: loads the configured slots and today's slot
//! runtime into a [`RosEditor`] and submits the unlocked allocations.

use std::sync::Arc;

use stakeboard_client::{DistributionService, MutationAck};
use stakeboard_core::ros_editor::{RosEditor, SlotRow};
use stakeboard_core::types::SlotNumber;

use crate::error::ConsoleError;
use crate::notify::Notifier;
use crate::poller::Refetch;

pub const OVER_ALLOCATION_WARNING: &str =
    "Total ROS across slots exceeds 100%. Distributions are cumulative across the day.";

const SAVED_MESSAGE: &str = "Slot allocations saved";

pub struct SlotAllocationWorkflow {
    api: Arc<dyn DistributionService>,
    notifier: Notifier,
    refetch: Option<Refetch>,
    editor: RosEditor,
    current_total_stakes: Option<f64>,
}

impl SlotAllocationWorkflow {
    /// Fetch slot settings and today's slot runtime, then build the editor.
    pub async fn load(
        api: Arc<dyn DistributionService>,
        notifier: Notifier,
    ) -> Result<Self, ConsoleError> {
        let loaded = async {
            let slots = api.get_distribution_slots().await?;
            let runtime = api.get_today_slots().await?;
            Ok::<_, ConsoleError>(RosEditor::new(slots, &runtime)?)
        }
        .await;

        let editor = loaded.map_err(|e| {
            tracing::warn!(error = %e, "Failed to load distribution slots");
            notifier.error(e.user_message());
            e
        })?;
        tracing::info!(slots = editor.slot_count(), "Loaded distribution slots");

        Ok(Self {
            api,
            notifier,
            refetch: None,
            editor,
            current_total_stakes: None,
        })
    }

    pub fn with_refetch(mut self, refetch: Refetch) -> Self {
        self.refetch = Some(refetch);
        self
    }

    /// Total active stakes used for the per-slot payout estimate.
    pub fn with_total_stakes(mut self, current_total_stakes: f64) -> Self {
        self.current_total_stakes = Some(current_total_stakes);
        self
    }

    pub fn editor(&self) -> &RosEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut RosEditor {
        &mut self.editor
    }

    pub fn rows(&self) -> Vec<SlotRow> {
        self.editor.rows(self.current_total_stakes)
    }

    /// Set one slot.  Returns the clamped value that was stored.
    pub fn set_percentage(
        &mut self,
        slot_number: SlotNumber,
        value: f64,
    ) -> Result<f64, ConsoleError> {
        self.editor.set_percentage(slot_number, value).map_err(|e| {
            self.notifier.error(e.to_string());
            ConsoleError::Core(e)
        })
    }

    /// Set every unlocked slot.  Returns how many slots changed.
    pub fn set_all(&mut self, value: f64) -> usize {
        let touched = self.editor.set_all(value);
        tracing::debug!(touched, value, "Set all unlocked slots");
        touched
    }

    pub fn clear(&mut self) -> usize {
        let touched = self.editor.clear();
        tracing::debug!(touched, "Cleared unlocked slots");
        touched
    }

    /// Non-blocking warning shown next to the total.
    pub fn total_warning(&self) -> Option<&'static str> {
        self.editor
            .exceeds_full_allocation()
            .then_some(OVER_ALLOCATION_WARNING)
    }

    /// Re-read today's slot runtime.  Locks are re-evaluated; unsaved edits
    /// to unlocked slots are kept.
    pub async fn refresh(&mut self) -> Result<(), ConsoleError> {
        match self.api.get_today_slots().await {
            Ok(runtime) => {
                self.editor.apply_runtime(&runtime);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh slot statuses");
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Submit every unlocked slot's allocation.
    pub async fn submit(&mut self) -> Result<MutationAck, ConsoleError> {
        let request = self.editor.to_request().map_err(|e| {
            self.notifier.error(e.to_string());
            ConsoleError::Core(e)
        })?;

        if let Some(warning) = self.total_warning() {
            self.notifier.warning(warning);
        }

        tracing::info!(
            slots = request.allocations.len(),
            total = self.editor.total(),
            "Submitting slot allocations"
        );

        match self.api.update_slot_allocations(&request).await {
            Ok(ack) => {
                self.notifier
                    .success(ack.message.clone().unwrap_or_else(|| SAVED_MESSAGE.to_string()));
                self.editor.mark_saved();
                if let Some(refetch) = &self.refetch {
                    refetch.trigger();
                }
                if let Err(e) = self.refresh().await {
                    tracing::debug!(error = %e, "Post-save slot refresh failed");
                }
                Ok(ack)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Slot allocation update failed");
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }
}
