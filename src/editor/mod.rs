pub mod reconciler;
pub mod session;
pub mod snapshot;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::api::ScheduleApi;
use crate::error::{ApiError, EditorError};
use crate::models::{
    BulkWriteResponse, EmployeeId, Schedule, ScheduleId, ScheduleShifts, Shift, ShiftKey,
    ShiftTypeId, TempShiftId,
};
use crate::services::RequestContext;

pub use reconciler::{Batch, PreparedSave, Reconciler, SaveOutcome, build_batch};
pub use session::{EditSession, GridDay, PendingEdit, PendingState, SessionShift};
pub use snapshot::{Snapshot, SnapshotStore};

/// Read model of one editor for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub schedule: Schedule,
    pub days: Vec<GridDay>,
    pub dirty: bool,
    pub saving: bool,
    pub stale: bool,
    pub last_error: Option<String>,
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Editing state of one open schedule: its snapshot, the session on top of
/// it and the reconciler that saves it.
///
/// Every intent is refused with `SaveInProgress` while a save is in flight.
#[derive(Debug)]
pub struct ScheduleEditor {
    store: SnapshotStore,
    session: EditSession,
    reconciler: Reconciler,
}

impl ScheduleEditor {
    pub fn from_snapshot(schedule: Schedule, shifts: ScheduleShifts) -> Self {
        let mut store = SnapshotStore::new(schedule.id.clone());
        let snapshot = store.replace(shifts);
        Self {
            session: EditSession::new(schedule, &snapshot),
            store,
            reconciler: Reconciler::new(),
        }
    }

    pub async fn open(
        api: &dyn ScheduleApi,
        schedule_id: &ScheduleId,
        ctx: &RequestContext,
    ) -> Result<Self, EditorError> {
        let schedule = api
            .get_schedules(ctx)
            .await?
            .into_iter()
            .find(|schedule| &schedule.id == schedule_id)
            .ok_or_else(|| EditorError::ScheduleNotFound(schedule_id.clone()))?;

        if !schedule.is_week() {
            log::warn!(
                "Schedule {} spans {} to {}, expected one week",
                schedule.id,
                schedule.start_date,
                schedule.end_date
            );
        }

        let mut store = SnapshotStore::new(schedule.id.clone());
        let snapshot = store.load(api, ctx).await?;
        log::info!(
            "Opened schedule {} ({}) with {} shifts",
            schedule.id,
            schedule.status,
            snapshot.shifts.len()
        );

        Ok(Self {
            session: EditSession::new(schedule, &snapshot),
            store,
            reconciler: Reconciler::new(),
        })
    }

    pub fn schedule(&self) -> &Schedule {
        self.session.schedule()
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn is_saving(&self) -> bool {
        self.reconciler.is_saving()
    }

    fn ensure_editable(&self) -> Result<(), EditorError> {
        if self.reconciler.is_saving() {
            return Err(EditorError::SaveInProgress);
        }
        Ok(())
    }

    pub fn move_shift(
        &mut self,
        key: &ShiftKey,
        date: NaiveDate,
        order: i32,
    ) -> Result<(), EditorError> {
        self.ensure_editable()?;
        self.session.move_shift(key, date, order)
    }

    pub fn assign_to_employee(
        &mut self,
        key: &ShiftKey,
        employee_id: EmployeeId,
    ) -> Result<(), EditorError> {
        self.ensure_editable()?;
        self.session.assign_to_employee(key, employee_id)
    }

    pub fn unassign(&mut self, key: &ShiftKey) -> Result<(), EditorError> {
        self.ensure_editable()?;
        self.session.unassign(key)
    }

    pub fn create_shift(
        &mut self,
        shift_type_id: ShiftTypeId,
        date: NaiveDate,
        order: i32,
    ) -> Result<TempShiftId, EditorError> {
        self.ensure_editable()?;
        self.session.create_shift(shift_type_id, date, order)
    }

    pub fn remove_shift(&mut self, key: &ShiftKey) -> Result<(), EditorError> {
        self.ensure_editable()?;
        self.session.remove_shift(key)
    }

    pub fn reset(&mut self) -> Result<(), EditorError> {
        self.ensure_editable()?;
        self.session.reset();
        Ok(())
    }

    pub fn build_batch(&self) -> Batch {
        self.reconciler.build_batch(&self.session)
    }

    /// Applies a refetched shift list. A clean session moves onto it; a dirty
    /// one keeps its baseline until saved or reset.
    pub fn apply_refresh(
        &mut self,
        result: Result<ScheduleShifts, ApiError>,
    ) -> Result<(), EditorError> {
        let snapshot = self.store.apply(result)?;
        if !self.session.is_dirty() && !self.reconciler.is_saving() {
            self.session.rebase(&snapshot);
        }
        Ok(())
    }

    pub async fn refresh(
        &mut self,
        api: &dyn ScheduleApi,
        ctx: &RequestContext,
    ) -> Result<(), EditorError> {
        let result = SnapshotStore::fetch(api, self.store.schedule_id(), ctx).await;
        self.apply_refresh(result)
    }

    pub fn prepare_save(&self, publish: bool) -> Result<PreparedSave, EditorError> {
        self.reconciler.prepare(&self.session, &self.store, publish)
    }

    pub fn complete_save(
        &mut self,
        prepared: PreparedSave,
        result: Result<BulkWriteResponse, ApiError>,
    ) -> Result<SaveOutcome, EditorError> {
        self.reconciler
            .complete(prepared, result, &mut self.session, &mut self.store)
    }

    pub async fn save(
        &mut self,
        api: &dyn ScheduleApi,
        publish: bool,
        ctx: &RequestContext,
    ) -> Result<SaveOutcome, EditorError> {
        self.reconciler
            .save(&mut self.session, &mut self.store, api, publish, ctx)
            .await
    }

    pub fn shift(&self, key: &ShiftKey) -> Option<SessionShift> {
        self.session.shift(key)
    }

    pub fn baseline_shift(&self, key: &ShiftKey) -> Option<&Shift> {
        key.persisted_id()
            .and_then(|id| self.session.baseline().get(id))
    }

    pub fn view(&self) -> EditorView {
        let snapshot = self.store.get();
        EditorView {
            schedule: self.session.schedule().clone(),
            days: self.session.week_grid(),
            dirty: self.session.is_dirty(),
            saving: self.reconciler.is_saving(),
            stale: self.store.is_stale(),
            last_error: self.store.last_error().map(str::to_string),
            loaded_at: snapshot.loaded_at,
        }
    }
}
