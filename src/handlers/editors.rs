use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::editor::{Batch, EditorView, SaveOutcome};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::models::{EmployeeId, ScheduleId, ShiftKey, ShiftTypeId};
use crate::services::RequestContext;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenEditorRequest {
    pub schedule_id: ScheduleId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShiftRequest {
    pub shift_type_id: ShiftTypeId,
    pub date: NaiveDate,
    /// Defaults to the first free order on `date`.
    pub order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct MoveShiftRequest {
    pub date: NaiveDate,
    pub order: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignShiftRequest {
    pub employee_id: EmployeeId,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorResponse {
    pub editor_id: Uuid,
    pub editor: EditorView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShiftResponse {
    pub key: ShiftKey,
    pub editor: EditorView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub outcome: SaveOutcome,
    pub editor: EditorView,
}

fn parse_key(raw: &str) -> Result<ShiftKey, AppError> {
    raw.parse().map_err(AppError::BadRequest)
}

pub async fn open_editor(
    state: web::Data<AppState>,
    input: web::Json<OpenEditorRequest>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let (editor_id, editor) = state.registry.open(&input.schedule_id, &ctx).await?;
    Ok(ApiResponse::created(EditorResponse { editor_id, editor }))
}

pub async fn get_editor(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let editor_id = path.into_inner();
    let editor = state.registry.view(editor_id, &ctx).await?;
    Ok(ApiResponse::ok(EditorResponse { editor_id, editor }))
}

pub async fn close_editor(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    state.registry.close(path.into_inner(), &ctx).await?;
    Ok(ApiResponse::message("Editor closed"))
}

pub async fn refresh_editor(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let editor_id = path.into_inner();
    let editor = state.registry.refresh(editor_id, &ctx).await?;
    Ok(ApiResponse::ok(EditorResponse { editor_id, editor }))
}

pub async fn create_shift(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: web::Json<CreateShiftRequest>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let input = input.into_inner();
    state
        .reference
        .require_active_shift_type(&input.shift_type_id, &ctx)
        .await?;

    let (temp_id, editor) = state
        .registry
        .edit(path.into_inner(), &ctx, |editor| {
            let order = input
                .order
                .unwrap_or_else(|| editor.session().next_free_order(input.date));
            editor.create_shift(input.shift_type_id, input.date, order)
        })
        .await?;

    Ok(ApiResponse::created(CreateShiftResponse {
        key: ShiftKey::Local(temp_id),
        editor,
    }))
}

pub async fn move_shift(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String)>,
    input: web::Json<MoveShiftRequest>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let (editor_id, raw_key) = path.into_inner();
    let key = parse_key(&raw_key)?;

    let (_, editor) = state
        .registry
        .edit(editor_id, &ctx, |editor| {
            editor.move_shift(&key, input.date, input.order)
        })
        .await?;

    Ok(ApiResponse::ok(EditorResponse { editor_id, editor }))
}

pub async fn assign_shift(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String)>,
    input: web::Json<AssignShiftRequest>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let (editor_id, raw_key) = path.into_inner();
    let key = parse_key(&raw_key)?;
    let employee_id = input.into_inner().employee_id;

    if !state.reference.employee_exists(&employee_id, &ctx).await? {
        return Err(AppError::BadRequest(format!(
            "Unknown employee {}",
            employee_id
        )));
    }

    let (_, editor) = state
        .registry
        .edit(editor_id, &ctx, |editor| editor.assign_to_employee(&key, employee_id))
        .await?;

    Ok(ApiResponse::ok(EditorResponse { editor_id, editor }))
}

pub async fn unassign_shift(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String)>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let (editor_id, raw_key) = path.into_inner();
    let key = parse_key(&raw_key)?;

    let (_, editor) = state
        .registry
        .edit(editor_id, &ctx, |editor| editor.unassign(&key))
        .await?;

    Ok(ApiResponse::ok(EditorResponse { editor_id, editor }))
}

pub async fn remove_shift(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, String)>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let (editor_id, raw_key) = path.into_inner();
    let key = parse_key(&raw_key)?;

    let (_, editor) = state
        .registry
        .edit(editor_id, &ctx, |editor| editor.remove_shift(&key))
        .await?;

    Ok(ApiResponse::ok(EditorResponse { editor_id, editor }))
}

pub async fn reset_editor(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let editor_id = path.into_inner();
    let (_, editor) = state
        .registry
        .edit(editor_id, &ctx, |editor| editor.reset())
        .await?;

    Ok(ApiResponse::ok(EditorResponse { editor_id, editor }))
}

pub async fn preview_batch(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let (batch, _) = state
        .registry
        .edit(path.into_inner(), &ctx, |editor| Ok::<Batch, _>(editor.build_batch()))
        .await?;

    Ok(ApiResponse::ok(batch))
}

pub async fn save_editor(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    input: Option<web::Json<SaveRequest>>,
    ctx: RequestContext,
) -> Result<HttpResponse, AppError> {
    let editor_id = path.into_inner();
    let publish = input.map(|json| json.into_inner().publish).unwrap_or(false);

    let (outcome, editor) = state.registry.save(editor_id, publish, ctx).await?;
    Ok(ApiResponse::ok(SaveResponse { outcome, editor }))
}
