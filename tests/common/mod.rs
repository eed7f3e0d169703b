#![allow(dead_code)]

use std::env;
use std::sync::{Arc, Mutex};

use actix_web::{App, web};
use chrono::{NaiveDate, NaiveTime};
use fake::Fake;
use fake::faker::name::en::Name;
use futures::FutureExt;
use futures::future::BoxFuture;

use hostelshifts::error::ApiError;
use hostelshifts::middleware::RequestIdMiddleware;
use hostelshifts::models::*;
use hostelshifts::services::{Credential, RequestContext};
use hostelshifts::{AppState, Config, ScheduleApi, routes};

pub const TOKEN: &str = "test-token";

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "debug");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        schedule_api_url: "http://schedule-api.test/api".to_string(),
        client_base_url: "http://localhost:3000".to_string(),
        employee_cache_ttl_secs: 60,
        editor_idle_timeout_secs: 60,
        default_locale: "en".to_string(),
    }
}

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

pub fn context() -> RequestContext {
    RequestContext {
        credential: Credential::new(TOKEN),
        locale: "en".to_string(),
        correlation_id: None,
    }
}

#[derive(Default)]
struct State {
    shifts: Vec<Shift>,
    next_id: usize,
    rejected_operation: Option<(usize, String)>,
    failed_operation: Option<(usize, String)>,
    bulk_requests: Vec<(BulkWriteRequest, String)>,
    employee_calls: usize,
}

/// Backend double: applies bulk writes to an in-memory shift list and only
/// accepts the `TOKEN` credential.
pub struct InMemoryScheduleApi {
    state: Mutex<State>,
    employees: Vec<Employee>,
}

impl InMemoryScheduleApi {
    pub fn new(shifts: Vec<Shift>) -> Self {
        let employees = (1..=8)
            .map(|n| Employee {
                id: EmployeeId::new(format!("emp-{}", n)),
                name: Name().fake(),
                role: "Receptionist".to_string(),
            })
            .collect();

        Self {
            state: Mutex::new(State {
                shifts,
                ..State::default()
            }),
            employees,
        }
    }

    pub fn shifts(&self) -> Vec<Shift> {
        self.state.lock().unwrap().shifts.clone()
    }

    pub fn bulk_requests(&self) -> Vec<BulkWriteRequest> {
        self.state
            .lock()
            .unwrap()
            .bulk_requests
            .iter()
            .map(|(request, _)| request.clone())
            .collect()
    }

    pub fn bulk_locales(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .bulk_requests
            .iter()
            .map(|(_, locale)| locale.clone())
            .collect()
    }

    pub fn employee_calls(&self) -> usize {
        self.state.lock().unwrap().employee_calls
    }

    pub fn reject_operation(&self, index: usize, error: &str) {
        self.state.lock().unwrap().rejected_operation = Some((index, error.to_string()));
    }

    /// Answers the next bulk write with a multi-status result where only
    /// operation `index` fails and the rest are applied.
    pub fn fail_operation(&self, index: usize, error: &str) {
        self.state.lock().unwrap().failed_operation = Some((index, error.to_string()));
    }

    fn authorize(ctx: &RequestContext) -> Result<(), ApiError> {
        if ctx.credential.expose() == TOKEN {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }

    fn write(
        &self,
        request: &BulkWriteRequest,
        ctx: &RequestContext,
    ) -> Result<BulkWriteResponse, ApiError> {
        Self::authorize(ctx)?;
        let mut state = self.state.lock().unwrap();
        state
            .bulk_requests
            .push((request.clone(), ctx.locale.clone()));

        if let Some((index, error)) = state.rejected_operation.take() {
            let results = vec![OperationResult {
                index,
                success: false,
                shift_id: None,
                correlation_id: None,
                error: Some(error),
            }];
            return Err(ApiError::Rejected {
                message: "Batch rejected".to_string(),
                results,
            });
        }

        let failed = state.failed_operation.take();

        let mut results = Vec::new();
        for (index, operation) in request.operations.iter().enumerate() {
            if let Some((_, error)) = failed.as_ref().filter(|(i, _)| *i == index) {
                results.push(OperationResult {
                    index,
                    success: false,
                    shift_id: None,
                    correlation_id: operation.correlation_id.clone(),
                    error: Some(error.clone()),
                });
                continue;
            }
            let shift_id = match (operation.op, operation.shift_id.clone()) {
                (OperationKind::Create, _) => {
                    state.next_id += 1;
                    let id = ShiftId::new(format!("srv-{}", state.next_id));
                    state.shifts.push(Shift {
                        id: id.clone(),
                        schedule_id: "sched-1".into(),
                        values: operation.values.clone(),
                    });
                    id
                }
                (OperationKind::Update, Some(id)) => {
                    for shift in state.shifts.iter_mut().filter(|s| s.id == id) {
                        shift.values = operation.values.clone();
                    }
                    id
                }
                (OperationKind::Delete, Some(id)) => {
                    state.shifts.retain(|s| s.id != id);
                    id
                }
                (_, None) => {
                    return Err(ApiError::Status {
                        status: 400,
                        message: "missing shiftId".to_string(),
                    });
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

impl ScheduleApi for InMemoryScheduleApi {
    fn get_schedules<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<Schedule>, ApiError>> {
        let result = Self::authorize(ctx).map(|_| vec![week_schedule()]);
        async move { result }.boxed()
    }

    fn get_shift_types<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<ShiftType>, ApiError>> {
        let result = Self::authorize(ctx).map(|_| {
            vec![
                ShiftType {
                    id: "shiftType-1".into(),
                    name: "Morning".to_string(),
                    start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
                    color_index: 1,
                    active: true,
                },
                ShiftType {
                    id: "shiftType-2".into(),
                    name: "Night".to_string(),
                    start_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                    color_index: 4,
                    active: true,
                },
                ShiftType {
                    id: "shiftType-old".into(),
                    name: "Split".to_string(),
                    start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                    color_index: 2,
                    active: false,
                },
            ]
        });
        async move { result }.boxed()
    }

    fn get_shifts_for_schedule<'a>(
        &'a self,
        _schedule_id: &'a ScheduleId,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<ScheduleShifts, ApiError>> {
        let result = Self::authorize(ctx).map(|_| ScheduleShifts::from_shifts(self.shifts()));
        async move { result }.boxed()
    }

    fn bulk_write_shifts<'a>(
        &'a self,
        _schedule_id: &'a ScheduleId,
        request: &'a BulkWriteRequest,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<BulkWriteResponse, ApiError>> {
        let result = self.write(request, ctx);
        async move { result }.boxed()
    }

    fn get_all_employees<'a>(
        &'a self,
        ctx: &'a RequestContext,
    ) -> BoxFuture<'a, Result<Vec<Employee>, ApiError>> {
        let result = Self::authorize(ctx).map(|_| {
            self.state.lock().unwrap().employee_calls += 1;
            self.employees.clone()
        });
        async move { result }.boxed()
    }
}

pub fn default_shifts() -> Vec<Shift> {
    vec![
        shift("A", "2024-01-15", 1, None),
        shift("B", "2024-01-15", 2, Some("emp-1")),
        shift("C", "2024-01-16", 1, None),
    ]
}

pub fn app_state(api: Arc<InMemoryScheduleApi>) -> web::Data<AppState> {
    web::Data::new(AppState::new(api, &test_config()))
}

/// Application wired like the production binary, minus CORS and logging.
pub fn build_app(
    state: web::Data<AppState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .app_data(web::Data::new(test_config()))
        .wrap(RequestIdMiddleware)
        .configure(routes::configure)
}
