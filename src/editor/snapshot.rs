use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::ScheduleApi;
use crate::error::{ApiError, EditorError};
use crate::models::{ScheduleId, ScheduleShifts};
use crate::services::RequestContext;

/// Last server-confirmed state of a schedule's shifts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub shifts: ScheduleShifts,
    /// `None` until the first successful load.
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Holds the authoritative shift list for one schedule.
///
/// The snapshot is swapped as a whole behind an `Arc`, so a reader holding a
/// previous snapshot keeps a consistent view across reloads.
#[derive(Debug)]
pub struct SnapshotStore {
    schedule_id: ScheduleId,
    current: Arc<Snapshot>,
    last_error: Option<String>,
}

impl SnapshotStore {
    pub fn new(schedule_id: ScheduleId) -> Self {
        Self {
            schedule_id,
            current: Arc::new(Snapshot::default()),
            last_error: None,
        }
    }

    pub fn schedule_id(&self) -> &ScheduleId {
        &self.schedule_id
    }

    pub fn get(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    /// True when the latest load failed and the held snapshot may be out of date.
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn fetch(
        api: &dyn ScheduleApi,
        schedule_id: &ScheduleId,
        ctx: &RequestContext,
    ) -> Result<ScheduleShifts, ApiError> {
        log::debug!("Fetching shifts for schedule {}", schedule_id);
        api.get_shifts_for_schedule(schedule_id, ctx).await
    }

    pub async fn load(
        &mut self,
        api: &dyn ScheduleApi,
        ctx: &RequestContext,
    ) -> Result<Arc<Snapshot>, EditorError> {
        let result = Self::fetch(api, &self.schedule_id, ctx).await;
        self.apply(result)
    }

    /// Applies the outcome of a fetch. A failure keeps the previous snapshot.
    pub fn apply(
        &mut self,
        result: Result<ScheduleShifts, ApiError>,
    ) -> Result<Arc<Snapshot>, EditorError> {
        match result {
            Ok(shifts) => Ok(self.replace(shifts)),
            Err(e) => {
                log::error!(
                    "Failed to load shifts for schedule {}: {}",
                    self.schedule_id,
                    e
                );
                let error = EditorError::from(e);
                if error != EditorError::Unauthorized {
                    self.last_error = Some(error.to_string());
                }
                Err(error)
            }
        }
    }

    pub fn replace(&mut self, shifts: ScheduleShifts) -> Arc<Snapshot> {
        log::debug!(
            "Snapshot for schedule {} replaced ({} shifts)",
            self.schedule_id,
            shifts.len()
        );
        self.current = Arc::new(Snapshot {
            shifts,
            loaded_at: Some(Utc::now()),
        });
        self.last_error = None;
        self.get()
    }
}
