use actix_web::{HttpResponse, web};

use crate::AppState;
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::RequestContext;

pub async fn get_schedules(
    state: web::Data<AppState>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let schedules = state.registry.api().get_schedules(&ctx).await?;
    Ok(ApiResponse::ok(schedules))
}

pub async fn get_employees(
    state: web::Data<AppState>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let employees = state.reference.employees(&ctx).await?;
    Ok(ApiResponse::ok(employees.as_ref()))
}

pub async fn get_shift_types(
    state: web::Data<AppState>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let shift_types = state.reference.shift_types(&ctx).await?;
    Ok(ApiResponse::ok(shift_types.as_ref()))
}
