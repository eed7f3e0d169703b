//! In-memory `ScheduleApi` for unit tests.

use std::sync::Mutex;

use chrono::{NaiveDate, NaiveTime};
use futures::FutureExt;
use futures::future::BoxFuture;

use super::ScheduleApi;
use crate::error::ApiError;
use crate::models::*;
use crate::services::{Credential, RequestContext};

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn shift(id: &str, day: &str, order: i32, employee: Option<&str>) -> Shift {
    Shift {
        id: id.into(),
        schedule_id: "sched-1".into(),
        values: ShiftValues {
            shift_type_id: "shiftType-1".into(),
            date: date(day),
            order,
            employee_id: employee.map(EmployeeId::from),
        },
    }
}

pub fn week_schedule() -> Schedule {
    Schedule {
        id: "sched-1".into(),
        name: "Week of 15 January".to_string(),
        start_date: date("2024-01-15"),
        end_date: date("2024-01-21"),
        status: ScheduleStatus::Draft,
    }
}

pub fn test_context() -> RequestContext {
    RequestContext {
        credential: Credential::new("test-token"),
        locale: "en".to_string(),
        correlation_id: None,
    }
}

#[derive(Default)]
struct State {
    shifts: Vec<Shift>,
    next_id: usize,
    fail_next_fetch: bool,
    fail_next_bulk_write: bool,
    rejected_operation: Option<(usize, String)>,
    unauthorized: bool,
    bulk_requests: Vec<BulkWriteRequest>,
}

pub struct FakeScheduleApi {
    state: Mutex<State>,
}

impl FakeScheduleApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn put_shifts(&self, shifts: Vec<Shift>) {
        self.state.lock().unwrap().shifts = shifts;
    }

    pub fn fail_next_fetch(&self) {
        self.state.lock().unwrap().fail_next_fetch = true;
    }

    pub fn fail_next_bulk_write(&self) {
        self.state.lock().unwrap().fail_next_bulk_write = true;
    }

    pub fn reject_operation(&self, index: usize, error: &str) {
        self.state.lock().unwrap().rejected_operation = Some((index, error.to_string()));
    }

    pub fn reject_credentials(&self) {
        self.state.lock().unwrap().unauthorized = true;
    }

    pub fn bulk_requests(&self) -> Vec<BulkWriteRequest> {
        self.state.lock().unwrap().bulk_requests.clone()
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.state.lock().unwrap().unauthorized {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }

    fn apply(&self, request: &BulkWriteRequest) -> Result<BulkWriteResponse, ApiError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.bulk_requests.push(request.clone());

        if std::mem::take(&mut state.fail_next_bulk_write) {
            return Err(ApiError::Transport("connection reset".to_string()));
        }

        // The rejected operation is skipped, the others still apply
        let rejected = state.rejected_operation.take();

        let mut results = Vec::new();
        for (index, operation) in request.operations.iter().enumerate() {
            if let Some((_, error)) = rejected.as_ref().filter(|(i, _)| *i == index) {
                results.push(OperationResult {
                    index,
                    success: false,
                    shift_id: None,
                    correlation_id: operation.correlation_id.clone(),
                    error: Some(error.clone()),
                });
                continue;
            }

            let shift_id = match operation.op {
                OperationKind::Create => {
                    state.next_id += 1;
                    let id = ShiftId::new(format!("srv-{}", state.next_id));
                    state.shifts.push(Shift {
                        id: id.clone(),
                        schedule_id: "sched-1".into(),
                        values: operation.values.clone(),
                    });
                    id
                }
                OperationKind::Update => {
                    let id = operation.shift_id.clone().unwrap();
                    if let Some(shift) = state.shifts.iter_mut().find(|s| s.id == id) {
                        shift.values = operation.values.clone();
                    }
                    id
                }
                OperationKind::Delete => {
                    let id = operation.shift_id.clone().unwrap();
                    state.shifts.retain(|s| s.id != id);
                    id
                }
            };
            results.push(OperationResult {
                index,
                success: true,
                shift_id: Some(shift_id),
                correlation_id: operation.correlation_id.clone(),
                error: None,
            });
        }

        Ok(BulkWriteResponse {
            results,
            shifts: ScheduleShifts::from_shifts(state.shifts.clone()),
        })
    }
}

impl ScheduleApi for FakeScheduleApi {
    fn get_schedules<'a>(
        &'a self,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<Schedule>, ApiError>> {
        let result = self.check().map(|_| vec![week_schedule()]);
        async move { result }.boxed()
    }

    fn get_shift_types<'a>(
        &'a self,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<ShiftType>, ApiError>> {
        let result = self.check().map(|_| {
            vec![ShiftType {
                id: "shiftType-1".into(),
                name: "Morning".to_string(),
                start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                color_index: 1,
                active: true,
            }]
        });
        async move { result }.boxed()
    }

    fn get_shifts_for_schedule<'a>(
        &'a self,
        _schedule_id: &'a ScheduleId,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<ScheduleShifts, ApiError>> {
        let result = self.check().and_then(|_| {
            let mut state = self.state.lock().unwrap();
            if std::mem::take(&mut state.fail_next_fetch) {
                return Err(ApiError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(ScheduleShifts::from_shifts(state.shifts.clone()))
        });
        async move { result }.boxed()
    }

    fn bulk_write_shifts<'a>(
        &'a self,
        _schedule_id: &'a ScheduleId,
        request: &'a BulkWriteRequest,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<BulkWriteResponse, ApiError>> {
        let result = self.apply(request);
        async move { result }.boxed()
    }

    fn get_all_employees<'a>(
        &'a self,
        _ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<Employee>, ApiError>> {
        let result = self.check().map(|_| {
            vec![Employee {
                id: "emp-7".into(),
                name: "Ana Souza".to_string(),
                role: "Receptionist".to_string(),
            }]
        });
        async move { result }.boxed()
    }
}
