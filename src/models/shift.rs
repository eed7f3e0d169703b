use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::employee::EmployeeId;
use super::macros::string_id;
use super::schedule::ScheduleId;

string_id! {
    pub struct ShiftId;
}

string_id! {
    pub struct ShiftTypeId;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftType {
    pub id: ShiftTypeId,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub color_index: u8,
    pub active: bool,
}

/// Fields of a shift the editor may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftValues {
    pub shift_type_id: ShiftTypeId,
    pub date: NaiveDate,
    pub order: i32,
    pub employee_id: Option<EmployeeId>,
}

impl ShiftValues {
    pub fn unassigned(shift_type_id: ShiftTypeId, date: NaiveDate, order: i32) -> Self {
        Self {
            shift_type_id,
            date,
            order,
            employee_id: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.employee_id.is_some()
    }

    pub fn slot(&self) -> (NaiveDate, i32) {
        (self.date, self.order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub schedule_id: ScheduleId,
    #[serde(flatten)]
    pub values: ShiftValues,
}

impl Shift {
    pub fn is_assigned(&self) -> bool {
        self.values.is_assigned()
    }
}

/// Shifts of one schedule as the backend partitions them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleShifts {
    pub assigned: Vec<Shift>,
    pub unassigned: Vec<Shift>,
}

impl ScheduleShifts {
    pub fn from_shifts(shifts: impl IntoIterator<Item = Shift>) -> Self {
        let (assigned, unassigned) = shifts.into_iter().partition(Shift::is_assigned);
        Self {
            assigned,
            unassigned,
        }
    }

    pub fn len(&self) -> usize {
        self.assigned.len() + self.unassigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shift> {
        self.assigned.iter().chain(self.unassigned.iter())
    }
}

/// Client-side identifier for a shift created during an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempShiftId(Uuid);

impl TempShiftId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TempShiftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifies a shift inside an edit session: either one the backend knows
/// or one created locally and not yet saved.
///
/// The text form is `p:<shiftId>` or `t:<uuid>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShiftKey {
    Persisted(ShiftId),
    Local(TempShiftId),
}

impl ShiftKey {
    pub fn is_local(&self) -> bool {
        matches!(self, ShiftKey::Local(_))
    }

    pub fn persisted_id(&self) -> Option<&ShiftId> {
        match self {
            ShiftKey::Persisted(id) => Some(id),
            ShiftKey::Local(_) => None,
        }
    }
}

impl From<ShiftId> for ShiftKey {
    fn from(id: ShiftId) -> Self {
        ShiftKey::Persisted(id)
    }
}

impl From<TempShiftId> for ShiftKey {
    fn from(id: TempShiftId) -> Self {
        ShiftKey::Local(id)
    }
}

impl std::fmt::Display for ShiftKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShiftKey::Persisted(id) => write!(f, "p:{}", id),
            ShiftKey::Local(id) => write!(f, "t:{}", id),
        }
    }
}

impl std::str::FromStr for ShiftKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("p", id)) if !id.is_empty() => Ok(ShiftKey::Persisted(ShiftId::new(id))),
            Some(("t", id)) => Uuid::parse_str(id)
                .map(|uuid| ShiftKey::Local(TempShiftId(uuid)))
                .map_err(|e| format!("Invalid temporary shift id {}: {}", id, e)),
            _ => Err(format!("Invalid shift key: {}", s)),
        }
    }
}

impl Serialize for ShiftKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ShiftKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
