//! Multi-slot ROS allocation editor.
//!
//! Holds one percentage per configured slot.  A slot whose runtime status
//! is COMPLETED or FAILED is locked: its value is read-only and bulk
//! operations always skip it.  Distributions are cumulative across the
//! day, so a total above 100 is allowed and
//! [`RosEditor::exceeds_full_allocation`] is a warning, never an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::slots::{validate_slot_config, DistributionSlot, SlotRunStatus, SlotState};
use crate::types::SlotNumber;

pub const MIN_PERCENTAGE: f64 = 0.0;
pub const MAX_PERCENTAGE: f64 = 100.0;

/// Clamp an entered percentage into `[0, 100]`.  Non-finite input becomes 0.
pub fn clamp_percentage(value: f64) -> f64 {
    if !value.is_finite() {
        return MIN_PERCENTAGE;
    }
    value.clamp(MIN_PERCENTAGE, MAX_PERCENTAGE)
}

/// Display-only estimate of what a slot would pay out.
pub fn estimated_distribution(current_total_stakes: f64, ros_percentage: f64) -> f64 {
    current_total_stakes * ros_percentage / 100.0
}

/// Allocation for a single slot, as submitted to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAllocation {
    pub slot_number: SlotNumber,
    pub ros_percentage: f64,
}

/// Body of the slot allocation update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAllocationRequest {
    pub allocations: Vec<SlotAllocation>,
}

/// One rendered editor row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRow {
    pub slot_number: SlotNumber,
    pub time: String,
    pub label: String,
    pub status: Option<SlotRunStatus>,
    pub ros_percentage: f64,
    pub locked: bool,
    pub estimated: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RosEditor {
    slots: Vec<DistributionSlot>,
    statuses: BTreeMap<SlotNumber, SlotRunStatus>,
    values: BTreeMap<SlotNumber, f64>,
    dirty: bool,
}

impl RosEditor {
    /// Build an editor for `slots`, defaulting each value to the last
    /// allocation the server reported for that slot (or 0).
    pub fn new(slots: Vec<DistributionSlot>, runtime: &[SlotState]) -> Result<Self, CoreError> {
        validate_slot_config(&slots)?;

        let values = (1..=slots.len() as SlotNumber).map(|n| (n, 0.0)).collect();
        let mut editor = Self {
            slots,
            statuses: BTreeMap::new(),
            values,
            dirty: false,
        };
        editor.apply_runtime(runtime);
        Ok(editor)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_status(&self, slot_number: SlotNumber) -> Option<SlotRunStatus> {
        self.statuses.get(&slot_number).copied()
    }

    /// `true` iff the server reports the slot as COMPLETED or FAILED.
    pub fn is_slot_locked(&self, slot_number: SlotNumber) -> bool {
        self.slot_status(slot_number)
            .is_some_and(SlotRunStatus::is_locked)
    }

    pub fn value(&self, slot_number: SlotNumber) -> Option<f64> {
        self.values.get(&slot_number).copied()
    }

    /// `true` when local edits have not been submitted yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set one slot's percentage, clamped into range.  Returns the stored
    /// value.
    pub fn set_percentage(
        &mut self,
        slot_number: SlotNumber,
        value: f64,
    ) -> Result<f64, CoreError> {
        if !self.values.contains_key(&slot_number) {
            return Err(CoreError::UnknownSlot(slot_number));
        }
        if self.is_slot_locked(slot_number) {
            return Err(CoreError::Locked { slot_number });
        }
        let clamped = clamp_percentage(value);
        self.values.insert(slot_number, clamped);
        self.dirty = true;
        Ok(clamped)
    }

    /// Apply `value` to every unlocked slot.  Returns how many slots changed.
    pub fn set_all(&mut self, value: f64) -> usize {
        let clamped = clamp_percentage(value);
        self.fill_unlocked(clamped)
    }

    /// Zero every unlocked slot.  Returns how many slots changed.
    pub fn clear(&mut self) -> usize {
        self.fill_unlocked(MIN_PERCENTAGE)
    }

    fn fill_unlocked(&mut self, value: f64) -> usize {
        let unlocked: Vec<SlotNumber> = self
            .values
            .keys()
            .copied()
            .filter(|n| !self.is_slot_locked(*n))
            .collect();

        for n in &unlocked {
            self.values.insert(*n, value);
        }
        if !unlocked.is_empty() {
            self.dirty = true;
        }
        unlocked.len()
    }

    /// Sum of every slot's value, locked slots included.
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    /// Non-blocking warning condition.
    pub fn exceeds_full_allocation(&self) -> bool {
        self.total() > MAX_PERCENTAGE
    }

    /// Display-only payout estimate for one slot.
    pub fn estimated(
        &self,
        slot_number: SlotNumber,
        current_total_stakes: Option<f64>,
    ) -> Option<f64> {
        let stakes = current_total_stakes?;
        let pct = self.value(slot_number)?;
        Some(estimated_distribution(stakes, pct))
    }

    pub fn rows(&self, current_total_stakes: Option<f64>) -> Vec<SlotRow> {
        self.slots
            .iter()
            .zip(1..)
            .map(|(slot, n)| SlotRow {
                slot_number: n,
                time: slot.time.clone(),
                label: slot.display_label(n),
                status: self.slot_status(n),
                ros_percentage: self.value(n).unwrap_or_default(),
                locked: self.is_slot_locked(n),
                estimated: self.estimated(n, current_total_stakes),
            })
            .collect()
    }

    /// Merge a fresh runtime snapshot from the server.
    ///
    /// Locks are re-evaluated every time.  Locked slots always take the
    /// server's value; unlocked slots take it only while there are no local
    /// edits.
    pub fn apply_runtime(&mut self, runtime: &[SlotState]) {
        for state in runtime {
            if !self.values.contains_key(&state.slot_number) {
                continue;
            }
            self.statuses.insert(state.slot_number, state.status);

            if let Some(server_value) = state.ros_percentage {
                if state.status.is_locked() || !self.dirty {
                    self.values
                        .insert(state.slot_number, clamp_percentage(server_value));
                }
            }
        }
    }

    /// Allocations for every unlocked slot, in slot order.
    pub fn allocations(&self) -> Vec<SlotAllocation> {
        self.values
            .iter()
            .filter(|(n, _)| !self.is_slot_locked(**n))
            .map(|(n, v)| SlotAllocation {
                slot_number: *n,
                ros_percentage: *v,
            })
            .collect()
    }

    /// Build the submission body.  Fails when every slot is locked.
    pub fn to_request(&self) -> Result<SlotAllocationRequest, CoreError> {
        let allocations = self.allocations();
        if allocations.is_empty() {
            return Err(CoreError::Validation(
                "All distribution slots for today are locked".into(),
            ));
        }
        Ok(SlotAllocationRequest { allocations })
    }

    /// Forget the dirty flag after a successful submission.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn slots(n: usize) -> Vec<DistributionSlot> {
        (0..n)
            .map(|i| DistributionSlot {
                time: format!("{:02}:00:00", 8 + i),
                label: None,
            })
            .collect()
    }

    fn state(slot_number: SlotNumber, status: SlotRunStatus, pct: Option<f64>) -> SlotState {
        SlotState {
            slot_number,
            status,
            ros_percentage: pct,
            executed_at: None,
            error: None,
        }
    }

    /// Slot 1 completed at 2%, slot 2 failed at 1%, slot 3 pending at 0.5%,
    /// slot 4 executing with no recorded value.
    fn mixed_editor() -> RosEditor {
        RosEditor::new(
            slots(4),
            &[
                state(1, SlotRunStatus::Completed, Some(2.0)),
                state(2, SlotRunStatus::Failed, Some(1.0)),
                state(3, SlotRunStatus::Pending, Some(0.5)),
                state(4, SlotRunStatus::Executing, None),
            ],
        )
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // Clamping
    // -----------------------------------------------------------------------

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_percentage(150.0), 100.0);
        assert_eq!(clamp_percentage(-5.0), 0.0);
        assert_eq!(clamp_percentage(42.5), 42.5);
        assert_eq!(clamp_percentage(f64::NAN), 0.0);
        assert_eq!(clamp_percentage(f64::INFINITY), 0.0);
        assert_eq!(clamp_percentage(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn set_percentage_zeroes_non_finite_input() {
        let mut editor = RosEditor::new(slots(2), &[]).unwrap();
        assert_eq!(editor.set_percentage(1, f64::INFINITY).unwrap(), 0.0);
        assert_eq!(editor.set_percentage(2, f64::NAN).unwrap(), 0.0);
        assert_eq!(editor.value(1), Some(0.0));
        assert_eq!(editor.total(), 0.0);
    }

    #[test]
    fn set_percentage_stores_clamped_value() {
        let mut editor = RosEditor::new(slots(2), &[]).unwrap();
        assert_eq!(editor.set_percentage(1, 150.0).unwrap(), 100.0);
        assert_eq!(editor.set_percentage(2, -5.0).unwrap(), 0.0);
        assert_eq!(editor.value(1), Some(100.0));
        assert_eq!(editor.value(2), Some(0.0));
        assert!(editor.is_dirty());
    }

    // -----------------------------------------------------------------------
    // Locking
    // -----------------------------------------------------------------------

    #[test]
    fn locked_iff_completed_or_failed() {
        let editor = mixed_editor();
        assert!(editor.is_slot_locked(1));
        assert!(editor.is_slot_locked(2));
        assert!(!editor.is_slot_locked(3));
        assert!(!editor.is_slot_locked(4));
    }

    #[test]
    fn slot_without_runtime_status_is_unlocked() {
        let editor = RosEditor::new(slots(1), &[]).unwrap();
        assert!(!editor.is_slot_locked(1));
    }

    #[test]
    fn locked_slot_rejects_edit() {
        let mut editor = mixed_editor();
        assert_matches!(editor.set_percentage(1, 5.0), Err(CoreError::Locked { slot_number: 1 }));
        assert_eq!(editor.value(1), Some(2.0));
    }

    #[test]
    fn unknown_slot_rejected() {
        let mut editor = mixed_editor();
        assert_matches!(editor.set_percentage(9, 5.0), Err(CoreError::UnknownSlot(9)));
    }

    // -----------------------------------------------------------------------
    // Bulk operations
    // -----------------------------------------------------------------------

    #[test]
    fn set_all_skips_locked_slots() {
        let mut editor = mixed_editor();
        assert_eq!(editor.set_all(7.0), 2);
        assert_eq!(editor.value(1), Some(2.0));
        assert_eq!(editor.value(2), Some(1.0));
        assert_eq!(editor.value(3), Some(7.0));
        assert_eq!(editor.value(4), Some(7.0));
    }

    #[test]
    fn set_all_clamps() {
        let mut editor = RosEditor::new(slots(2), &[]).unwrap();
        editor.set_all(250.0);
        assert_eq!(editor.value(1), Some(100.0));
        assert_eq!(editor.value(2), Some(100.0));
    }

    #[test]
    fn clear_skips_locked_slots() {
        let mut editor = mixed_editor();
        editor.set_all(3.0);
        assert_eq!(editor.clear(), 2);
        assert_eq!(editor.value(1), Some(2.0));
        assert_eq!(editor.value(2), Some(1.0));
        assert_eq!(editor.value(3), Some(0.0));
        assert_eq!(editor.value(4), Some(0.0));
    }

    #[test]
    fn bulk_on_fully_locked_editor_changes_nothing() {
        let mut editor = RosEditor::new(
            slots(2),
            &[
                state(1, SlotRunStatus::Completed, Some(4.0)),
                state(2, SlotRunStatus::Failed, Some(6.0)),
            ],
        )
        .unwrap();
        assert_eq!(editor.set_all(50.0), 0);
        assert_eq!(editor.clear(), 0);
        assert!(!editor.is_dirty());
        assert_eq!(editor.total(), 10.0);
    }

    // -----------------------------------------------------------------------
    // Totals and estimates
    // -----------------------------------------------------------------------

    #[test]
    fn total_is_sum_of_all_slots() {
        let mut editor = mixed_editor();
        editor.set_percentage(3, 10.0).unwrap();
        editor.set_percentage(4, 20.0).unwrap();
        assert_eq!(editor.total(), 2.0 + 1.0 + 10.0 + 20.0);
        assert!(!editor.exceeds_full_allocation());
    }

    #[test]
    fn over_hundred_warns_but_still_submits() {
        let mut editor = RosEditor::new(slots(3), &[]).unwrap();
        editor.set_all(60.0);
        assert_eq!(editor.total(), 180.0);
        assert!(editor.exceeds_full_allocation());
        assert_eq!(editor.to_request().unwrap().allocations.len(), 3);
    }

    #[test]
    fn estimate_requires_stakes() {
        let mut editor = RosEditor::new(slots(1), &[]).unwrap();
        editor.set_percentage(1, 2.5).unwrap();
        assert_eq!(editor.estimated(1, Some(10_000.0)), Some(250.0));
        assert_eq!(editor.estimated(1, None), None);
    }

    #[test]
    fn rows_reflect_slot_config_and_locks() {
        let rows = mixed_editor().rows(Some(1000.0));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].label, "Slot 1");
        assert_eq!(rows[0].time, "08:00:00");
        assert!(rows[0].locked);
        assert_eq!(rows[0].estimated, Some(20.0));
        assert_eq!(rows[2].status, Some(SlotRunStatus::Pending));
        assert!(!rows[2].locked);
    }

    // -----------------------------------------------------------------------
    // Server reconciliation
    // -----------------------------------------------------------------------

    #[test]
    fn defaults_come_from_server_values() {
        let editor = mixed_editor();
        assert_eq!(editor.value(3), Some(0.5));
        assert_eq!(editor.value(4), Some(0.0));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn runtime_refresh_keeps_unlocked_edits_but_locks_newly_completed() {
        let mut editor = mixed_editor();
        editor.set_percentage(3, 9.0).unwrap();
        editor.set_percentage(4, 4.0).unwrap();

        editor.apply_runtime(&[
            state(3, SlotRunStatus::Pending, Some(0.5)),
            state(4, SlotRunStatus::Completed, Some(1.25)),
        ]);

        assert_eq!(editor.value(3), Some(9.0));
        assert!(editor.is_slot_locked(4));
        assert_eq!(editor.value(4), Some(1.25));
    }

    #[test]
    fn allocations_exclude_locked_slots() {
        let mut editor = mixed_editor();
        editor.set_all(5.0);
        let request = editor.to_request().unwrap();
        let numbers: Vec<_> = request.allocations.iter().map(|a| a.slot_number).collect();
        assert_eq!(numbers, vec![3, 4]);
    }

    #[test]
    fn fully_locked_editor_has_nothing_to_submit() {
        let completed = [state(1, SlotRunStatus::Completed, Some(1.0))];
        let editor = RosEditor::new(slots(1), &completed).unwrap();
        assert_matches!(editor.to_request(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn mark_saved_clears_dirty_flag() {
        let mut editor = mixed_editor();
        editor.set_all(1.0);
        editor.mark_saved();
        assert!(!editor.is_dirty());
    }
}
