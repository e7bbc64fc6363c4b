//! Queue / modify / cancel workflow for today's single distribution.
//!
//! The workflow owns the form draft and mirrors the last observed server
//! snapshot.  Poll results overwrite the form only while there are no
//! local changes; leaving EMPTY/PENDING for a server-driven state throws
//! the draft away.  Every outcome is reported through the [`Notifier`].

use std::sync::Arc;

use tokio::sync::watch;

use stakeboard_client::{DistributionService, MutationAck};
use stakeboard_core::distribution::{
    validate_action, DistributionAction, DistributionState, DistributionStatus,
};
use stakeboard_core::error::CoreError;
use stakeboard_core::form::FormValues;

use crate::draft::{DraftStore, TODAY_DISTRIBUTION_DRAFT_KEY};
use crate::error::ConsoleError;
use crate::notify::Notifier;
use crate::poller::Refetch;

pub const CANCEL_PROMPT: &str =
    "Cancel today's queued distribution? The queued values will be discarded.";

const QUEUED_MESSAGE: &str = "Distribution queued";
const UPDATED_MESSAGE: &str = "Distribution updated";
const CANCELLED_MESSAGE: &str = "Distribution cancelled";

/// Two-step cancel confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelConfirmation {
    #[default]
    Idle,
    Prompted,
}

pub struct TodayDistributionWorkflow {
    api: Arc<dyn DistributionService>,
    notifier: Notifier,
    refetch: Option<Refetch>,
    drafts: Option<DraftStore>,
    status: Option<DistributionStatus>,
    form: FormValues,
    is_editing: bool,
    has_changes: bool,
    confirmation: CancelConfirmation,
}

impl TodayDistributionWorkflow {
    pub fn new(api: Arc<dyn DistributionService>, notifier: Notifier) -> Self {
        Self {
            api,
            notifier,
            refetch: None,
            drafts: None,
            status: None,
            form: FormValues::default(),
            is_editing: false,
            has_changes: false,
            confirmation: CancelConfirmation::Idle,
        }
    }

    /// Poke the status poller after every successful mutation instead of
    /// fetching directly.  Pair with [`sync_from`](Self::sync_from).
    pub fn with_refetch(mut self, refetch: Refetch) -> Self {
        self.refetch = Some(refetch);
        self
    }

    /// Cache the form in `store` and restore any draft saved there.
    pub fn with_draft_store(mut self, store: DraftStore) -> Self {
        match store.load::<FormValues>(TODAY_DISTRIBUTION_DRAFT_KEY) {
            Ok(Some(form)) => {
                tracing::info!(path = %store.path().display(), "Restored distribution draft");
                self.form = form;
                self.has_changes = true;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring unreadable distribution draft"),
        }
        self.drafts = Some(store);
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn status(&self) -> Option<&DistributionStatus> {
        self.status.as_ref()
    }

    pub fn state(&self) -> Option<DistributionState> {
        self.status.as_ref().map(|s| s.status)
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    pub fn cancel_confirmation(&self) -> CancelConfirmation {
        self.confirmation
    }

    /// Whether the form currently accepts input.
    pub fn can_edit(&self) -> bool {
        match self.state() {
            Some(DistributionState::Empty) => true,
            Some(DistributionState::Pending) => self.is_editing,
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Server sync
    // -----------------------------------------------------------------------

    /// Fold a fresh server snapshot into the workflow.
    pub fn observe(&mut self, status: DistributionStatus) {
        let editable = matches!(
            status.status,
            DistributionState::Empty | DistributionState::Pending
        );

        if !editable && (self.has_changes || self.is_editing) {
            tracing::info!(
                state = %status.status,
                "Distribution left editable state, discarding local changes"
            );
            self.has_changes = false;
            self.is_editing = false;
            self.clear_draft();
        }
        if status.status != DistributionState::Pending {
            self.is_editing = false;
            self.confirmation = CancelConfirmation::Idle;
        } else if self.has_changes && !self.is_editing {
            // A restored draft against a queued distribution resumes editing.
            self.is_editing = true;
        }

        if !self.has_changes {
            self.form = status
                .values
                .as_ref()
                .map(FormValues::from)
                .unwrap_or_default();
        }
        self.status = Some(status);
    }

    /// Observe the poller's latest snapshot if it changed since the last
    /// call.  Returns `true` when a snapshot was folded in.
    pub fn sync_from(&mut self, status: &mut watch::Receiver<Option<DistributionStatus>>) -> bool {
        if !status.has_changed().unwrap_or(false) {
            return false;
        }
        match status.borrow_and_update().clone() {
            Some(snapshot) => {
                self.observe(snapshot);
                true
            }
            None => false,
        }
    }

    /// Fetch the current snapshot and [`observe`](Self::observe) it.
    pub async fn refresh(&mut self) -> Result<(), ConsoleError> {
        match self.api.get_today_status().await {
            Ok(status) => {
                self.observe(status);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load distribution status");
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Enter edit mode for a queued (PENDING) distribution.
    pub fn start_editing(&mut self) -> Result<(), ConsoleError> {
        let state = self.require_state()?;
        reject(&self.notifier, validate_action(state, DistributionAction::Modify))?;
        self.is_editing = true;
        Ok(())
    }

    /// Leave edit mode and drop local changes.
    pub fn stop_editing(&mut self) {
        self.is_editing = false;
        self.has_changes = false;
        self.clear_draft();
        self.form = self.server_form();
    }

    /// Apply `edit` to the form.  Allowed when EMPTY, or PENDING in edit mode.
    pub fn update_form(&mut self, edit: impl FnOnce(&mut FormValues)) -> Result<(), ConsoleError> {
        if !self.can_edit() {
            let err = ConsoleError::Core(CoreError::Validation(
                "Today's distribution cannot be edited right now".into(),
            ));
            self.notifier.error(err.user_message());
            return Err(err);
        }
        edit(&mut self.form);
        self.has_changes = true;
        self.save_draft();
        Ok(())
    }

    pub fn set_ros_percentage(&mut self, value: f64) -> Result<(), ConsoleError> {
        self.update_form(|f| f.ros_percentage = value)
    }

    pub fn set_premium_pool_amount(&mut self, value: f64) -> Result<(), ConsoleError> {
        self.update_form(|f| f.premium_pool_amount = value)
    }

    pub fn set_performance_pool_amount(&mut self, value: f64) -> Result<(), ConsoleError> {
        self.update_form(|f| f.performance_pool_amount = value)
    }

    pub fn set_description(&mut self, value: impl Into<String>) -> Result<(), ConsoleError> {
        let value = value.into();
        self.update_form(|f| f.description = value)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Queue (EMPTY) or modify (PENDING, editing) with the current form.
    ///
    /// Validation failures never reach the network.  Server failures leave
    /// the form and edit mode untouched.
    pub async fn submit(&mut self) -> Result<MutationAck, ConsoleError> {
        let action = self.submit_action()?;
        let request = reject(&self.notifier, self.form.to_request())?;

        tracing::info!(
            %action,
            ros_percentage = request.ros_percentage,
            premium_pool_amount = request.premium_pool_amount,
            performance_pool_amount = request.performance_pool_amount,
            "Submitting distribution"
        );

        let result = if action == DistributionAction::Queue {
            self.api.queue_distribution(&request).await
        } else {
            self.api.modify_distribution(&request).await
        };

        match result {
            Ok(ack) => {
                let fallback = if action == DistributionAction::Queue {
                    QUEUED_MESSAGE
                } else {
                    UPDATED_MESSAGE
                };
                self.notifier
                    .success(ack.message.clone().unwrap_or_else(|| fallback.to_string()));
                self.after_mutation().await;
                Ok(ack)
            }
            Err(e) => {
                tracing::warn!(%action, error = %e, "Distribution submission failed");
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    /// First step of cancelling: returns the confirmation prompt.
    pub fn request_cancel(&mut self) -> Result<&'static str, ConsoleError> {
        let state = self.require_state()?;
        reject(&self.notifier, validate_action(state, DistributionAction::Cancel))?;
        self.confirmation = CancelConfirmation::Prompted;
        Ok(CANCEL_PROMPT)
    }

    pub fn dismiss_cancel(&mut self) {
        self.confirmation = CancelConfirmation::Idle;
    }

    /// Second step of cancelling.  Requires a prior
    /// [`request_cancel`](Self::request_cancel).
    pub async fn confirm_cancel(&mut self) -> Result<MutationAck, ConsoleError> {
        if self.confirmation != CancelConfirmation::Prompted {
            let err = ConsoleError::Core(CoreError::Validation(
                "Cancellation has not been requested".into(),
            ));
            self.notifier.error(err.user_message());
            return Err(err);
        }
        self.confirmation = CancelConfirmation::Idle;

        tracing::info!("Cancelling today's distribution");
        match self.api.cancel_distribution().await {
            Ok(ack) => {
                self.notifier.success(
                    ack.message
                        .clone()
                        .unwrap_or_else(|| CANCELLED_MESSAGE.to_string()),
                );
                self.after_mutation().await;
                Ok(ack)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Distribution cancel failed");
                self.notifier.error(e.user_message());
                Err(e.into())
            }
        }
    }

    // ---- private helpers ----

    fn require_state(&self) -> Result<DistributionState, ConsoleError> {
        self.state().ok_or_else(|| {
            ConsoleError::Core(CoreError::Validation(
                "Distribution status has not been loaded yet".into(),
            ))
        })
    }

    fn submit_action(&self) -> Result<DistributionAction, ConsoleError> {
        let state = self.require_state()?;
        let action = match state {
            DistributionState::Empty => DistributionAction::Queue,
            DistributionState::Pending if self.is_editing => DistributionAction::Modify,
            DistributionState::Pending => {
                let err = ConsoleError::Core(CoreError::Validation(
                    "Start editing before modifying today's distribution".into(),
                ));
                self.notifier.error(err.user_message());
                return Err(err);
            }
            _ => DistributionAction::Queue,
        };
        reject(&self.notifier, validate_action(state, action))?;
        Ok(action)
    }

    async fn after_mutation(&mut self) {
        self.is_editing = false;
        self.has_changes = false;
        self.clear_draft();
        if let Some(refetch) = &self.refetch {
            refetch.trigger();
        } else if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "Post-mutation refresh failed");
        }
    }

    fn server_form(&self) -> FormValues {
        self.status
            .as_ref()
            .and_then(|s| s.values.as_ref())
            .map(FormValues::from)
            .unwrap_or_default()
    }

    fn save_draft(&self) {
        if let Some(store) = &self.drafts {
            if let Err(e) = store.save(TODAY_DISTRIBUTION_DRAFT_KEY, &self.form) {
                tracing::warn!(error = %e, "Failed to save distribution draft");
            }
        }
    }

    fn clear_draft(&self) {
        if let Some(store) = &self.drafts {
            if let Err(e) = store.remove(TODAY_DISTRIBUTION_DRAFT_KEY) {
                tracing::warn!(error = %e, "Failed to clear distribution draft");
            }
        }
    }
}

/// Toast a core rejection before handing it back.
fn reject<T>(notifier: &Notifier, result: Result<T, CoreError>) -> Result<T, ConsoleError> {
    result.map_err(|e| {
        notifier.error(e.to_string());
        ConsoleError::Core(e)
    })
}

