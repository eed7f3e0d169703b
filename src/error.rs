use std::collections::BTreeMap;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::handlers::shared::ApiResponse;
use crate::models::{OperationKind, OperationResult, ScheduleId, ShiftId, ShiftKey, TempShiftId};

/// Failures reported by the external Schedule API client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Bulk write rejected: {message}")]
    Rejected {
        message: String,
        results: Vec<OperationResult>,
    },
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        log::error!("Schedule API transport error: {}", error);
        ApiError::Transport(error.to_string())
    }
}

/// A pending edit the backend refused to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedOperation {
    pub index: usize,
    pub key: ShiftKey,
    pub op: OperationKind,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFailure {
    pub message: String,
    /// Empty when the backend only reported a batch-level failure.
    pub failed: Vec<FailedOperation>,
    /// Session-local shifts the backend created before the batch failed.
    /// Saving again without resetting creates them a second time.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub created: BTreeMap<TempShiftId, ShiftId>,
}

impl std::fmt::Display for SaveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.failed.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} ({} operation(s) failed)", self.message, self.failed.len())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("Placement conflict: {date} order {order} is occupied by {occupied_by}")]
    PlacementConflict {
        date: NaiveDate,
        order: i32,
        occupied_by: ShiftKey,
    },

    #[error("Date {date} is outside the schedule ({start} to {end})")]
    OutsideSchedule {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Shift not found: {0}")]
    ShiftNotFound(ShiftKey),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(ScheduleId),

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Failed to fetch data: {0}")]
    FetchError(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Save failed: {0}")]
    SaveFailure(SaveFailure),
}

impl From<ApiError> for EditorError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Unauthorized => EditorError::Unauthorized,
            other => EditorError::FetchError(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Editor(error) => match error {
                EditorError::PlacementConflict { .. } => StatusCode::CONFLICT,
                EditorError::OutsideSchedule { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                EditorError::ShiftNotFound(_) | EditorError::ScheduleNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                EditorError::SaveInProgress => StatusCode::LOCKED,
                EditorError::FetchError(_) | EditorError::SaveFailure(_) => StatusCode::BAD_GATEWAY,
                EditorError::Unauthorized => StatusCode::UNAUTHORIZED,
            },
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        if status_code.is_server_error() {
            log::error!(
                "Request failed with status {}: {}",
                status_code,
                error_message
            );
        } else {
            log::warn!(
                "Request rejected with status {}: {}",
                status_code,
                error_message
            );
        }

        match self {
            AppError::Editor(EditorError::SaveFailure(failure)) => HttpResponse::build(status_code)
                .json(ApiResponse::error_with_data(failure, &error_message)),
            AppError::Editor(EditorError::PlacementConflict { occupied_by, .. }) => {
                HttpResponse::build(status_code).json(ApiResponse::error_with_data(
                    serde_json::json!({ "occupiedBy": occupied_by }),
                    &error_message,
                ))
            }
            _ => HttpResponse::build(status_code).json(ApiResponse::<()>::error(&error_message)),
        }
    }
}

impl AppError {
    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }
}

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        AppError::Editor(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let conflict = AppError::from(EditorError::PlacementConflict {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            order: 1,
            occupied_by: "p:shift-1".parse().unwrap(),
        });
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(EditorError::SaveInProgress).status_code(),
            StatusCode::LOCKED
        );
        assert_eq!(
            AppError::from(ApiError::Unauthorized).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(ApiError::Transport("connection refused".to_string())).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_save_failure_message() {
        let failure = SaveFailure {
            message: "Backend rejected batch".to_string(),
            failed: vec![FailedOperation {
                index: 0,
                key: "p:shift-1".parse().unwrap(),
                op: OperationKind::Update,
                error: "slot taken".to_string(),
            }],
            created: BTreeMap::new(),
        };
        assert_eq!(
            EditorError::SaveFailure(failure).to_string(),
            "Save failed: Backend rejected batch (1 operation(s) failed)"
        );
    }
}
