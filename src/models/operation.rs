use serde::{Deserialize, Serialize};

use super::macros::string_enum;
use super::schedule::ScheduleStatus;
use super::shift::{ScheduleShifts, ShiftId, ShiftValues};

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub enum OperationKind {
        Create => "create",
        Update => "update",
        Delete => "delete",
    }
}

/// One entry of a bulk batch.
///
/// Updates and deletes carry the backend `shift_id`; creates carry a
/// `correlation_id` the response echoes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftOperation {
    pub op: OperationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<ShiftId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(flatten)]
    pub values: ShiftValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWriteRequest {
    pub operations: Vec<ShiftOperation>,
    pub target_status: ScheduleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub index: usize,
    pub success: bool,
    #[serde(default)]
    pub shift_id: Option<ShiftId>,
    #[serde(default)]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWriteResponse {
    #[serde(default)]
    pub results: Vec<OperationResult>,
    pub shifts: ScheduleShifts,
}

impl BulkWriteResponse {
    pub fn failed(&self) -> impl Iterator<Item = &OperationResult> {
        self.results.iter().filter(|result| !result.success)
    }
}
