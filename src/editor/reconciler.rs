use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::api::ScheduleApi;
use crate::error::{ApiError, EditorError, FailedOperation, SaveFailure};
use crate::models::{
    BulkWriteRequest, BulkWriteResponse, OperationKind, OperationResult, ScheduleId,
    ScheduleShifts, ScheduleStatus, ShiftId, ShiftKey, ShiftOperation, TempShiftId,
};
use crate::services::RequestContext;

use super::session::{EditSession, PendingState};
use super::snapshot::SnapshotStore;

/// Operations for the bulk endpoint, each paired with the session key it
/// was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub operations: Vec<ShiftOperation>,
    #[serde(skip)]
    pub keys: Vec<ShiftKey>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|op| op.op == kind).count()
    }
}

/// Builds the batch for a session's pending edits.
///
/// Creates come first, then updates, then deletes. Within a kind,
/// operations are ordered by date, order and key. The backend applies the
/// batch as a whole, so slots freed by deletes are available to creates.
pub fn build_batch(session: &EditSession) -> Batch {
    let mut entries: Vec<(OperationKind, ShiftKey, ShiftOperation)> = session
        .pending()
        .iter()
        .filter(|(_, edit)| edit.state != PendingState::Unchanged)
        .map(|(key, edit)| {
            let op = match (key, edit.state) {
                (ShiftKey::Local(_), _) => OperationKind::Create,
                (ShiftKey::Persisted(_), PendingState::Deleted) => OperationKind::Delete,
                (ShiftKey::Persisted(_), _) => OperationKind::Update,
            };
            let operation = ShiftOperation {
                op,
                shift_id: key.persisted_id().cloned(),
                correlation_id: match key {
                    ShiftKey::Local(temp_id) => Some(temp_id.to_string()),
                    ShiftKey::Persisted(_) => None,
                },
                values: edit.values.clone(),
            };
            (op, key.clone(), operation)
        })
        .collect();

    entries.sort_by(|(kind_a, key_a, op_a), (kind_b, key_b, op_b)| {
        kind_a
            .cmp(kind_b)
            .then_with(|| op_a.values.slot().cmp(&op_b.values.slot()))
            .then_with(|| key_a.cmp(key_b))
    });

    let (keys, operations) = entries
        .into_iter()
        .map(|(_, key, operation)| (key, operation))
        .unzip();

    Batch { operations, keys }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub status: ScheduleStatus,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Server identifiers assigned to shifts created in the session.
    pub created_ids: BTreeMap<TempShiftId, ShiftId>,
}

/// Clears the "save in progress" flag when dropped.
#[derive(Debug)]
struct SaveGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// A save that has claimed the in-progress flag and frozen its batch.
#[derive(Debug)]
pub struct PreparedSave {
    schedule_id: ScheduleId,
    batch: Batch,
    target_status: ScheduleStatus,
    /// No edits and the schedule already has the target status.
    up_to_date: bool,
    _guard: SaveGuard,
}

impl PreparedSave {
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn target_status(&self) -> ScheduleStatus {
        self.target_status
    }

    pub fn needs_request(&self) -> bool {
        !self.up_to_date
    }

    pub fn request(&self) -> BulkWriteRequest {
        BulkWriteRequest {
            operations: self.batch.operations.clone(),
            target_status: self.target_status,
        }
    }

    /// Sends the batch. A save with no edits that would not change the
    /// schedule status answers locally.
    pub async fn send(
        &self,
        api: &dyn ScheduleApi,
        ctx: &RequestContext,
    ) -> Result<BulkWriteResponse, ApiError> {
        if self.up_to_date {
            log::debug!("Nothing to save for schedule {}", self.schedule_id);
            return Ok(BulkWriteResponse {
                results: Vec::new(),
                shifts: ScheduleShifts::default(),
            });
        }

        log::info!(
            "Saving {} operation(s) for schedule {} as {}",
            self.batch.len(),
            self.schedule_id,
            self.target_status
        );
        api.bulk_write_shifts(&self.schedule_id, &self.request(), ctx)
            .await
    }
}

/// Applies edit sessions to the backend.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    saving: Arc<AtomicBool>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    pub fn build_batch(&self, session: &EditSession) -> Batch {
        build_batch(session)
    }

    /// Claims the in-progress flag and freezes the batch to send.
    pub fn prepare(
        &self,
        session: &EditSession,
        store: &SnapshotStore,
        publish: bool,
    ) -> Result<PreparedSave, EditorError> {
        if self.saving.swap(true, Ordering::SeqCst) {
            return Err(EditorError::SaveInProgress);
        }
        let guard = SaveGuard {
            flag: Arc::clone(&self.saving),
        };

        let batch = build_batch(session);
        let target_status = ScheduleStatus::target(publish);
        let up_to_date = batch.is_empty() && session.schedule().status == target_status;

        Ok(PreparedSave {
            schedule_id: store.schedule_id().clone(),
            batch,
            target_status,
            up_to_date,
            _guard: guard,
        })
    }

    /// Applies the backend's answer. On success the snapshot is replaced and
    /// the session restarts on it; on failure both are left untouched.
    pub fn complete(
        &self,
        prepared: PreparedSave,
        result: Result<BulkWriteResponse, ApiError>,
        session: &mut EditSession,
        store: &mut SnapshotStore,
    ) -> Result<SaveOutcome, EditorError> {
        let batch = &prepared.batch;

        // Nothing was sent, so the store keeps its snapshot and stale flag
        if prepared.up_to_date {
            return Ok(SaveOutcome {
                status: prepared.target_status,
                created: 0,
                updated: 0,
                deleted: 0,
                created_ids: BTreeMap::new(),
            });
        }

        let response = match result {
            Ok(response) => response,
            Err(ApiError::Unauthorized) => return Err(EditorError::Unauthorized),
            Err(ApiError::Rejected { message, results }) => {
                return Err(save_failure(batch, message, &results));
            }
            Err(e) => {
                log::error!("Bulk write for schedule {} failed: {}", prepared.schedule_id, e);
                return Err(EditorError::SaveFailure(SaveFailure {
                    message: e.to_string(),
                    failed: Vec::new(),
                    created: BTreeMap::new(),
                }));
            }
        };

        if response.failed().next().is_some() {
            return Err(save_failure(
                batch,
                "Some changes were not saved".to_string(),
                &response.results,
            ));
        }

        let created_ids = created_ids(batch, &response.results);

        let snapshot = store.replace(response.shifts);
        let mut schedule = session.schedule().clone();
        schedule.status = prepared.target_status;
        session.set_schedule(schedule);
        session.rebase(&snapshot);

        Ok(SaveOutcome {
            status: prepared.target_status,
            created: batch.count(OperationKind::Create),
            updated: batch.count(OperationKind::Update),
            deleted: batch.count(OperationKind::Delete),
            created_ids,
        })
    }

    pub async fn save(
        &self,
        session: &mut EditSession,
        store: &mut SnapshotStore,
        api: &dyn ScheduleApi,
        publish: bool,
        ctx: &RequestContext,
    ) -> Result<SaveOutcome, EditorError> {
        let prepared = self.prepare(session, store, publish)?;
        let result = prepared.send(api, ctx).await;
        self.complete(prepared, result, session, store)
    }
}

/// Maps temporary ids to the server ids of creates the backend applied.
fn created_ids(batch: &Batch, results: &[OperationResult]) -> BTreeMap<TempShiftId, ShiftId> {
    results
        .iter()
        .filter(|result| result.success)
        .filter_map(|result| {
            let correlation_id = result.correlation_id.as_deref()?;
            let shift_id = result.shift_id.clone()?;
            batch.keys.iter().find_map(|key| match key {
                ShiftKey::Local(temp_id) if temp_id.to_string() == correlation_id => {
                    Some((*temp_id, shift_id.clone()))
                }
                _ => None,
            })
        })
        .collect()
}

fn save_failure(batch: &Batch, message: String, results: &[OperationResult]) -> EditorError {
    let failed: Vec<FailedOperation> = results
        .iter()
        .filter(|result| !result.success)
        .filter_map(|result| {
            let key = batch.keys.get(result.index)?;
            let operation = batch.operations.get(result.index)?;
            Some(FailedOperation {
                index: result.index,
                key: key.clone(),
                op: operation.op,
                error: result
                    .error
                    .clone()
                    .unwrap_or_else(|| "Operation failed".to_string()),
            })
        })
        .collect();

    for failure in &failed {
        log::error!(
            "Operation {} ({} {}) failed: {}",
            failure.index,
            failure.op,
            failure.key,
            failure.error
        );
    }

    let created = created_ids(batch, results);
    if !created.is_empty() {
        log::warn!(
            "Batch failed after the backend created {} shift(s): {:?}",
            created.len(),
            created
        );
    }

    EditorError::SaveFailure(SaveFailure {
        message,
        failed,
        created,
    })
}
