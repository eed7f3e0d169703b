use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::api::ScheduleApi;
use crate::error::{ApiError, AppError, EditorError};
use crate::models::{Employee, EmployeeId, ShiftType, ShiftTypeId};
use crate::services::{Credential, RequestContext};

/// Cached read-only reference data: the employee directory and the shift
/// type catalog. Entries are keyed by credential so one caller never sees
/// data fetched with another caller's token.
#[derive(Clone)]
pub struct ReferenceData {
    api: Arc<dyn ScheduleApi>,
    employees: Cache<Credential, Arc<Vec<Employee>>>,
    shift_types: Cache<Credential, Arc<Vec<ShiftType>>>,
}

fn cached_error(error: Arc<ApiError>) -> EditorError {
    match error.as_ref() {
        ApiError::Unauthorized => EditorError::Unauthorized,
        other => EditorError::FetchError(other.to_string()),
    }
}

impl ReferenceData {
    pub fn new(api: Arc<dyn ScheduleApi>, ttl: Duration) -> Self {
        Self {
            api,
            employees: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(ttl)
                .build(),
            shift_types: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn employees(&self, ctx: &RequestContext) -> Result<Arc<Vec<Employee>>, EditorError> {
        self.employees
            .try_get_with(ctx.credential.clone(), async {
                log::debug!("Employee directory cache miss");
                self.api.get_all_employees(ctx).await.map(Arc::new)
            })
            .await
            .map_err(cached_error)
    }

    pub async fn shift_types(
        &self,
        ctx: &RequestContext,
    ) -> Result<Arc<Vec<ShiftType>>, EditorError> {
        self.shift_types
            .try_get_with(ctx.credential.clone(), async {
                log::debug!("Shift type catalog cache miss");
                self.api.get_shift_types(ctx).await.map(Arc::new)
            })
            .await
            .map_err(cached_error)
    }

    /// Rejects shift types that are unknown or no longer active.
    pub async fn require_active_shift_type(
        &self,
        shift_type_id: &ShiftTypeId,
        ctx: &RequestContext,
    ) -> Result<(), AppError> {
        let shift_types = self.shift_types(ctx).await?;
        match shift_types.iter().find(|t| &t.id == shift_type_id) {
            Some(shift_type) if shift_type.active => Ok(()),
            Some(_) => Err(AppError::BadRequest(format!(
                "Shift type {} is inactive",
                shift_type_id
            ))),
            None => Err(AppError::BadRequest(format!(
                "Unknown shift type {}",
                shift_type_id
            ))),
        }
    }

    pub async fn employee_exists(
        &self,
        employee_id: &EmployeeId,
        ctx: &RequestContext,
    ) -> Result<bool, EditorError> {
        Ok(self
            .employees(ctx)
            .await?
            .iter()
            .any(|employee| &employee.id == employee_id))
    }
}
