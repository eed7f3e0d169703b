//! Client side of the external Schedule and Employee Directory APIs.

pub mod http;
#[cfg(test)]
pub mod testing;

use futures::future::BoxFuture;

use crate::error::ApiError;
use crate::models::{
    BulkWriteRequest, BulkWriteResponse, Employee, Schedule, ScheduleId, ScheduleShifts,
    ShiftType,
};
use crate::services::RequestContext;

pub use http::HttpScheduleApi;

/// Backend operations the editor consumes.
///
/// Every call carries the caller's `RequestContext` so the credential and
/// locale travel with the request instead of living in global state.
pub trait ScheduleApi: Send + Sync {
    fn get_schedules<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<Schedule>, ApiError>>;

    fn get_shift_types<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<ShiftType>, ApiError>>;

    fn get_shifts_for_schedule<'a>(
        &'a self,
        schedule_id: &'a ScheduleId,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<ScheduleShifts, ApiError>>;

    fn bulk_write_shifts<'a>(
        &'a self,
        schedule_id: &'a ScheduleId,
        request: &'a BulkWriteRequest,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<BulkWriteResponse, ApiError>>;

    fn get_all_employees<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<Employee>, ApiError>>;
}
