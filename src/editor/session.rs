use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::EditorError;
use crate::models::macros::string_enum;
use crate::models::{
    EmployeeId, Schedule, Shift, ShiftId, ShiftKey, ShiftTypeId, ShiftValues, TempShiftId,
};

use super::snapshot::Snapshot;

string_enum! {
    /// Last transition applied to a shift during the session.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum PendingState {
        Created => "created",
        Moved => "moved",
        Assigned => "assigned",
        Unassigned => "unassigned",
        Deleted => "deleted",
        Unchanged => "unchanged",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEdit {
    pub state: PendingState,
    /// Field values after the edit. For deletions, the values at removal time.
    #[serde(flatten)]
    pub values: ShiftValues,
}

/// A live shift as the editor currently sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionShift {
    pub key: ShiftKey,
    pub state: PendingState,
    #[serde(flatten)]
    pub values: ShiftValues,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDay {
    pub date: NaiveDate,
    pub shifts: Vec<SessionShift>,
}

/// Unsaved edits layered over a snapshot baseline.
///
/// Every shift key appears at most once in `pending`. Shifts created in the
/// session and removed again are dropped rather than recorded as deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    schedule: Schedule,
    baseline: BTreeMap<ShiftId, Shift>,
    pending: BTreeMap<ShiftKey, PendingEdit>,
}

impl EditSession {
    pub fn new(schedule: Schedule, snapshot: &Snapshot) -> Self {
        Self::from_shifts(schedule, snapshot.shifts.iter().cloned())
    }

    pub fn from_shifts(schedule: Schedule, shifts: impl IntoIterator<Item = Shift>) -> Self {
        Self {
            schedule,
            baseline: shifts
                .into_iter()
                .map(|shift| (shift.id.clone(), shift))
                .collect(),
            pending: BTreeMap::new(),
        }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn baseline(&self) -> &BTreeMap<ShiftId, Shift> {
        &self.baseline
    }

    pub fn pending(&self) -> &BTreeMap<ShiftKey, PendingEdit> {
        &self.pending
    }

    pub fn is_dirty(&self) -> bool {
        self.pending
            .values()
            .any(|edit| edit.state != PendingState::Unchanged)
    }

    /// Current values of a live shift, `None` if unknown or deleted.
    pub fn current(&self, key: &ShiftKey) -> Option<&ShiftValues> {
        match self.pending.get(key) {
            Some(edit) if edit.state == PendingState::Deleted => None,
            Some(edit) => Some(&edit.values),
            None => key
                .persisted_id()
                .and_then(|id| self.baseline.get(id))
                .map(|shift| &shift.values),
        }
    }

    pub fn shift(&self, key: &ShiftKey) -> Option<SessionShift> {
        let values = self.current(key)?.clone();
        let state = self
            .pending
            .get(key)
            .map_or(PendingState::Unchanged, |edit| edit.state);
        Some(SessionShift {
            key: key.clone(),
            state,
            values,
        })
    }

    /// All live shifts ordered by date, then order.
    pub fn shifts(&self) -> Vec<SessionShift> {
        let untouched = self
            .baseline
            .iter()
            .map(|(id, shift)| (ShiftKey::Persisted(id.clone()), shift))
            .filter(|(key, _)| !self.pending.contains_key(key))
            .map(|(key, shift)| SessionShift {
                key,
                state: PendingState::Unchanged,
                values: shift.values.clone(),
            });

        let edited = self
            .pending
            .iter()
            .filter(|(_, edit)| edit.state != PendingState::Deleted)
            .map(|(key, edit)| SessionShift {
                key: key.clone(),
                state: edit.state,
                values: edit.values.clone(),
            });

        let mut shifts: Vec<SessionShift> = untouched.chain(edited).collect();
        shifts.sort_by(|a, b| {
            a.values
                .slot()
                .cmp(&b.values.slot())
                .then_with(|| a.key.cmp(&b.key))
        });
        shifts
    }

    pub fn assigned(&self) -> Vec<SessionShift> {
        self.shifts()
            .into_iter()
            .filter(|shift| shift.values.is_assigned())
            .collect()
    }

    pub fn unassigned(&self) -> Vec<SessionShift> {
        self.shifts()
            .into_iter()
            .filter(|shift| !shift.values.is_assigned())
            .collect()
    }

    /// Live shifts grouped per day of the schedule.
    pub fn week_grid(&self) -> Vec<GridDay> {
        let shifts = self.shifts();
        self.schedule
            .dates()
            .into_iter()
            .map(|date| GridDay {
                date,
                shifts: shifts
                    .iter()
                    .filter(|shift| shift.values.date == date)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    /// Smallest order >= 1 not taken on `date`.
    pub fn next_free_order(&self, date: NaiveDate) -> i32 {
        let mut order = 1;
        while self.occupant(date, order, None).is_some() {
            order += 1;
        }
        order
    }

    fn occupant(&self, date: NaiveDate, order: i32, except: Option<&ShiftKey>) -> Option<ShiftKey> {
        let baseline = self
            .baseline
            .iter()
            .filter(|(id, _)| !self.pending.contains_key(&ShiftKey::Persisted((*id).clone())))
            .filter(|(_, shift)| shift.values.slot() == (date, order))
            .map(|(id, _)| ShiftKey::Persisted(id.clone()));

        let pending = self
            .pending
            .iter()
            .filter(|(_, edit)| edit.state != PendingState::Deleted)
            .filter(|(_, edit)| edit.values.slot() == (date, order))
            .map(|(key, _)| key.clone());

        baseline
            .chain(pending)
            .find(|key| Some(key) != except)
    }

    fn check_placement(
        &self,
        date: NaiveDate,
        order: i32,
        moving: Option<&ShiftKey>,
    ) -> Result<(), EditorError> {
        if !self.schedule.contains(date) {
            return Err(EditorError::OutsideSchedule {
                date,
                start: self.schedule.start_date,
                end: self.schedule.end_date,
            });
        }

        if let Some(occupied_by) = self.occupant(date, order, moving) {
            log::warn!(
                "Placement conflict at {} order {}: occupied by {}",
                date,
                order,
                occupied_by
            );
            return Err(EditorError::PlacementConflict {
                date,
                order,
                occupied_by,
            });
        }

        Ok(())
    }

    fn live_values(&self, key: &ShiftKey) -> Result<ShiftValues, EditorError> {
        self.current(key)
            .cloned()
            .ok_or_else(|| EditorError::ShiftNotFound(key.clone()))
    }

    fn record(&mut self, key: ShiftKey, state: PendingState, values: ShiftValues) {
        log::debug!("Shift {} -> {}", key, state);
        self.pending.insert(key, PendingEdit { state, values });
    }

    pub fn move_shift(
        &mut self,
        key: &ShiftKey,
        date: NaiveDate,
        order: i32,
    ) -> Result<(), EditorError> {
        let mut values = self.live_values(key)?;
        if values.slot() == (date, order) {
            return Ok(());
        }

        self.check_placement(date, order, Some(key))?;

        values.date = date;
        values.order = order;
        self.record(key.clone(), PendingState::Moved, values);
        Ok(())
    }

    pub fn assign_to_employee(
        &mut self,
        key: &ShiftKey,
        employee_id: EmployeeId,
    ) -> Result<(), EditorError> {
        let mut values = self.live_values(key)?;
        if values.employee_id.as_ref() == Some(&employee_id) {
            return Ok(());
        }

        values.employee_id = Some(employee_id);
        self.record(key.clone(), PendingState::Assigned, values);
        Ok(())
    }

    pub fn unassign(&mut self, key: &ShiftKey) -> Result<(), EditorError> {
        let mut values = self.live_values(key)?;
        if values.employee_id.is_none() {
            return Ok(());
        }

        values.employee_id = None;
        self.record(key.clone(), PendingState::Unassigned, values);
        Ok(())
    }

    pub fn create_shift(
        &mut self,
        shift_type_id: ShiftTypeId,
        date: NaiveDate,
        order: i32,
    ) -> Result<TempShiftId, EditorError> {
        self.check_placement(date, order, None)?;

        let temp_id = TempShiftId::generate();
        self.record(
            ShiftKey::Local(temp_id),
            PendingState::Created,
            ShiftValues::unassigned(shift_type_id, date, order),
        );
        Ok(temp_id)
    }

    pub fn remove_shift(&mut self, key: &ShiftKey) -> Result<(), EditorError> {
        let values = self.live_values(key)?;

        if key.is_local() {
            log::debug!("Discarding unsaved shift {}", key);
            self.pending.remove(key);
        } else {
            self.record(key.clone(), PendingState::Deleted, values);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Starts over on a new baseline, dropping all pending edits.
    pub fn rebase(&mut self, snapshot: &Snapshot) {
        self.baseline = snapshot
            .shifts
            .iter()
            .map(|shift| (shift.id.clone(), shift.clone()))
            .collect();
        self.pending.clear();
    }

    pub(crate) fn set_schedule(&mut self, schedule: Schedule) {
        self.schedule = schedule;
    }
}
