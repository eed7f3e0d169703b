use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::macros::{string_enum, string_id};

string_id! {
    pub struct ScheduleId;
}

string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum ScheduleStatus {
        #[default]
        Draft => "draft",
        Published => "published",
    }
}

impl ScheduleStatus {
    /// Status requested from the bulk endpoint for a save.
    pub fn target(publish: bool) -> Self {
        if publish {
            ScheduleStatus::Published
        } else {
            ScheduleStatus::Draft
        }
    }
}

/// Days covered by one schedule, start and end inclusive.
pub const SCHEDULE_LENGTH_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
}

impl Schedule {
    pub fn is_published(&self) -> bool {
        self.status == ScheduleStatus::Published
    }

    /// Whether the range is exactly one contiguous week.
    pub fn is_week(&self) -> bool {
        self.start_date.checked_add_days(Days::new(SCHEDULE_LENGTH_DAYS - 1)) == Some(self.end_date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|date| *date <= self.end_date)
            .collect()
    }
}
