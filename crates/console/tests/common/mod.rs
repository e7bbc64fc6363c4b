//! Shared fixtures for console integration tests.
//!
//! [`FakeDistributionService`] is an in-memory stand-in for the platform
//! API.  It applies queue/modify/cancel the way the server does, counts
//! status fetches, and can be told to fail.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::broadcast;

use stakeboard_client::{DistributionApiError, DistributionService, MutationAck};
use stakeboard_console::notify::Toast;
use stakeboard_core::distribution::{DistributionState, DistributionStatus, DistributionValues};
use stakeboard_core::form::DistributionRequest;
use stakeboard_core::ros_editor::SlotAllocationRequest;
use stakeboard_core::slots::{DistributionSlot, SlotRunStatus, SlotState};
use stakeboard_core::wat::daily_cutoff;

#[derive(Default)]
struct FakeState {
    status: Option<DistributionStatus>,
    slots: Vec<DistributionSlot>,
    runtime: Vec<SlotState>,
    fail_fetches: bool,
    mutation_error: Option<String>,
    queued: Vec<DistributionRequest>,
    modified: Vec<DistributionRequest>,
    allocations: Vec<SlotAllocationRequest>,
    cancels: usize,
}

#[derive(Default)]
pub struct FakeDistributionService {
    state: Mutex<FakeState>,
    fetches: AtomicUsize,
}

impl FakeDistributionService {
    pub fn new(status: DistributionStatus) -> Arc<Self> {
        let fake = Self::default();
        fake.set_status(status);
        Arc::new(fake)
    }

    pub fn with_slots(slots: Vec<DistributionSlot>, runtime: Vec<SlotState>) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.status = Some(DistributionStatus::empty());
            state.slots = slots;
            state.runtime = runtime;
        }
        Arc::new(fake)
    }

    pub fn set_status(&self, status: DistributionStatus) {
        self.state.lock().unwrap().status = Some(status);
    }

    pub fn set_runtime(&self, runtime: Vec<SlotState>) {
        self.state.lock().unwrap().runtime = runtime;
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.state.lock().unwrap().fail_fetches = fail;
    }

    /// Make every mutation fail with a 400 carrying `message`.
    pub fn fail_mutations(&self, message: impl Into<String>) {
        self.state.lock().unwrap().mutation_error = Some(message.into());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn queued(&self) -> Vec<DistributionRequest> {
        self.state.lock().unwrap().queued.clone()
    }

    pub fn modified(&self) -> Vec<DistributionRequest> {
        self.state.lock().unwrap().modified.clone()
    }

    pub fn allocations(&self) -> Vec<SlotAllocationRequest> {
        self.state.lock().unwrap().allocations.clone()
    }

    pub fn cancels(&self) -> usize {
        self.state.lock().unwrap().cancels
    }

    fn check_mutation(state: &FakeState) -> Result<(), DistributionApiError> {
        match &state.mutation_error {
            Some(message) => Err(DistributionApiError::ApiError {
                status: 400,
                message: Some(message.clone()),
            }),
            None => Ok(()),
        }
    }

    fn current_state(state: &FakeState) -> DistributionState {
        state
            .status
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(DistributionState::Empty)
    }
}

fn values_of(request: &DistributionRequest) -> DistributionValues {
    DistributionValues {
        ros_percentage: request.ros_percentage,
        premium_pool_amount: request.premium_pool_amount,
        performance_pool_amount: request.performance_pool_amount,
        description: request.description.clone(),
    }
}

fn rejected(message: &str) -> DistributionApiError {
    DistributionApiError::ApiError {
        status: 400,
        message: Some(message.to_string()),
    }
}

#[async_trait]
impl DistributionService for FakeDistributionService {
    async fn get_today_status(&self) -> Result<DistributionStatus, DistributionApiError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_fetches {
            return Err(DistributionApiError::ApiError {
                status: 503,
                message: None,
            });
        }
        Ok(state.status.clone().unwrap_or_else(DistributionStatus::empty))
    }

    async fn queue_distribution(
        &self,
        request: &DistributionRequest,
    ) -> Result<MutationAck, DistributionApiError> {
        let mut state = self.state.lock().unwrap();
        Self::check_mutation(&state)?;
        if Self::current_state(&state) != DistributionState::Empty {
            return Err(rejected("Distribution already queued for today"));
        }
        state.queued.push(request.clone());
        state.status = Some(DistributionStatus {
            status: DistributionState::Pending,
            scheduled_for: Some(daily_cutoff(Utc::now()).with_timezone(&Utc)),
            values: Some(values_of(request)),
            last_execution: None,
        });
        Ok(MutationAck {
            message: Some("Distribution queued".into()),
        })
    }

    async fn modify_distribution(
        &self,
        request: &DistributionRequest,
    ) -> Result<MutationAck, DistributionApiError> {
        let mut state = self.state.lock().unwrap();
        Self::check_mutation(&state)?;
        if Self::current_state(&state) != DistributionState::Pending {
            return Err(rejected("No pending distribution to modify"));
        }
        state.modified.push(request.clone());
        if let Some(status) = state.status.as_mut() {
            status.values = Some(values_of(request));
        }
        Ok(MutationAck {
            message: Some("Distribution updated".into()),
        })
    }

    async fn cancel_distribution(&self) -> Result<MutationAck, DistributionApiError> {
        let mut state = self.state.lock().unwrap();
        Self::check_mutation(&state)?;
        if Self::current_state(&state) != DistributionState::Pending {
            return Err(rejected("No pending distribution to cancel"));
        }
        state.cancels += 1;
        state.status = Some(DistributionStatus::empty());
        // Server sends no message; the client falls back to its own text.
        Ok(MutationAck::default())
    }

    async fn get_distribution_slots(&self) -> Result<Vec<DistributionSlot>, DistributionApiError> {
        Ok(self.state.lock().unwrap().slots.clone())
    }

    async fn get_today_slots(&self) -> Result<Vec<SlotState>, DistributionApiError> {
        let state = self.state.lock().unwrap();
        if state.fail_fetches {
            return Err(DistributionApiError::ApiError {
                status: 503,
                message: None,
            });
        }
        Ok(state.runtime.clone())
    }

    async fn update_slot_allocations(
        &self,
        request: &SlotAllocationRequest,
    ) -> Result<MutationAck, DistributionApiError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        Self::check_mutation(state)?;
        state.allocations.push(request.clone());

        for allocation in &request.allocations {
            match state
                .runtime
                .iter_mut()
                .find(|s| s.slot_number == allocation.slot_number)
            {
                Some(slot) if slot.status.is_locked() => {
                    return Err(rejected("Cannot change a completed slot"));
                }
                Some(slot) => slot.ros_percentage = Some(allocation.ros_percentage),
                None => state.runtime.push(slot_state(
                    allocation.slot_number,
                    SlotRunStatus::Pending,
                    Some(allocation.ros_percentage),
                )),
            }
        }
        Ok(MutationAck {
            message: Some("Slots updated".into()),
        })
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn status(state: DistributionState) -> DistributionStatus {
    DistributionStatus {
        status: state,
        ..DistributionStatus::empty()
    }
}

/// PENDING, scheduled `in_secs` from now, with ROS 5% and a 100 premium pool.
pub fn pending_in(in_secs: i64) -> DistributionStatus {
    DistributionStatus {
        status: DistributionState::Pending,
        scheduled_for: Some(Utc::now() + Duration::seconds(in_secs)),
        values: Some(DistributionValues {
            ros_percentage: 5.0,
            premium_pool_amount: 100.0,
            performance_pool_amount: 0.0,
            description: Some("Daily".into()),
        }),
        last_execution: None,
    }
}

pub fn slot(time: &str, label: Option<&str>) -> DistributionSlot {
    DistributionSlot {
        time: time.into(),
        label: label.map(Into::into),
    }
}

pub fn slot_state(slot_number: u32, status: SlotRunStatus, ros: Option<f64>) -> SlotState {
    SlotState {
        slot_number,
        status,
        ros_percentage: ros,
        executed_at: None,
        error: None,
    }
}

/// Everything currently buffered on a toast receiver.
pub fn drain(rx: &mut broadcast::Receiver<Toast>) -> Vec<Toast> {
    let mut toasts = Vec::new();
    while let Ok(toast) = rx.try_recv() {
        toasts.push(toast);
    }
    toasts
}

/// Let spawned tasks run without advancing the paused clock.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
