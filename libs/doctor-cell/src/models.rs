use serde::{Deserialize, Serialize};
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
    pub is_active: bool,
}

// ==============================================================================
// AVAILABILITY WINDOWS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    Active,
    Inactive,
}

/// 0 = Sunday, 1 = Monday, ... 6 = Saturday.
pub fn day_of_week_index(weekday: Weekday) -> i32 {
    weekday.num_days_from_sunday() as i32
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityWindow {
    pub id: i64,
    pub doctor_id: i64,
    pub day_of_week: i32,
    /// Set for one-off windows; `None` means the window recurs weekly.
    pub specific_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: WindowStatus,
}

impl AvailabilityWindow {
    pub fn is_active(&self) -> bool {
        self.status == WindowStatus::Active
    }

    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match self.specific_date {
            Some(specific) => specific == date,
            None => self.day_of_week == day_of_week_index(date.weekday()),
        }
    }

    /// Half-open membership: `start <= time < end`.
    pub fn covers(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.is_active()
            && self.applies_on(date)
            && self.start_time <= time
            && time < self.end_time
    }

    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        !(self.end_time <= start || self.start_time >= end)
    }

    /// A dated window shares its weekday with the weekly windows of that day.
    /// Two dated windows only meet on the same date.
    fn shares_scope(&self, day_of_week: i32, specific_date: Option<NaiveDate>) -> bool {
        if self.day_of_week != day_of_week {
            return false;
        }
        match (self.specific_date, specific_date) {
            (Some(existing), Some(requested)) => existing == requested,
            _ => true,
        }
    }
}

/// First active window that can apply on the same day and overlaps `[start, end)`.
pub fn find_overlap<'a>(
    windows: &'a [AvailabilityWindow],
    day_of_week: i32,
    specific_date: Option<NaiveDate>,
    start: NaiveTime,
    end: NaiveTime,
    exclude_id: Option<i64>,
) -> Option<&'a AvailabilityWindow> {
    windows.iter().find(|window| {
        Some(window.id) != exclude_id
            && window.is_active()
            && window.shares_scope(day_of_week, specific_date)
            && window.overlaps(start, end)
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAvailabilityRequest {
    /// Optional when `specific_date` is given; the weekday is taken from the date.
    pub day_of_week: Option<i32>,
    pub specific_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl CreateAvailabilityRequest {
    pub fn resolved_day_of_week(&self) -> Result<i32, AvailabilityError> {
        let day = match (self.specific_date, self.day_of_week) {
            (Some(date), _) => day_of_week_index(date.weekday()),
            (None, Some(day)) => day,
            (None, None) => return Err(AvailabilityError::InvalidDayOfWeek(-1)),
        };

        if !(0..=6).contains(&day) {
            return Err(AvailabilityError::InvalidDayOfWeek(day));
        }

        Ok(day)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub status: Option<WindowStatus>,
}

#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Start time must be before end time")]
    InvalidTimeRange,

    #[error("Day of week must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidDayOfWeek(i32),

    #[error("Availability conflicts with existing schedule")]
    Overlap,

    #[error("Availability window not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
