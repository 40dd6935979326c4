use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    day_of_week_index, find_overlap, AvailabilityError, AvailabilityWindow,
    CreateAvailabilityRequest, UpdateAvailabilityRequest, WindowStatus,
};

const TIME_FORMAT: &str = "%H:%M:%S";

pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_window(
        &self,
        doctor_id: i64,
        request: CreateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, AvailabilityError> {
        debug!("Creating availability window for doctor: {}", doctor_id);

        if request.start_time >= request.end_time {
            return Err(AvailabilityError::InvalidTimeRange);
        }
        let day_of_week = request.resolved_day_of_week()?;

        if self.has_overlap(
            doctor_id,
            day_of_week,
            request.specific_date,
            request.start_time,
            request.end_time,
            None,
        ).await? {
            warn!("Rejected overlapping window for doctor {} on day {}", doctor_id, day_of_week);
            return Err(AvailabilityError::Overlap);
        }

        let window_data = json!({
            "doctor_id": doctor_id,
            "day_of_week": day_of_week,
            "specific_date": request.specific_date,
            "start_time": request.start_time.format(TIME_FORMAT).to_string(),
            "end_time": request.end_time.format(TIME_FORMAT).to_string(),
            "status": WindowStatus::Active,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/availability_windows",
            None,
            Some(window_data),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        let window = Self::first_window(result)?
            .ok_or_else(|| anyhow!("Failed to create availability window"))?;
        info!("Availability window {} created for doctor {}", window.id, doctor_id);

        Ok(window)
    }

    pub async fn update_window(
        &self,
        window_id: i64,
        request: UpdateAvailabilityRequest,
    ) -> Result<AvailabilityWindow, AvailabilityError> {
        debug!("Updating availability window: {}", window_id);

        let current = self.get_window(window_id).await?
            .ok_or(AvailabilityError::NotFound)?;

        let start = request.start_time.unwrap_or(current.start_time);
        let end = request.end_time.unwrap_or(current.end_time);
        if start >= end {
            return Err(AvailabilityError::InvalidTimeRange);
        }

        let becomes_active = request.status.unwrap_or(current.status) == WindowStatus::Active;
        if becomes_active && self.has_overlap(
            current.doctor_id,
            current.day_of_week,
            current.specific_date,
            start,
            end,
            Some(window_id),
        ).await? {
            return Err(AvailabilityError::Overlap);
        }

        let mut update_data = serde_json::Map::new();
        if let Some(start_time) = request.start_time {
            update_data.insert("start_time".to_string(), json!(start_time.format(TIME_FORMAT).to_string()));
        }
        if let Some(end_time) = request.end_time {
            update_data.insert("end_time".to_string(), json!(end_time.format(TIME_FORMAT).to_string()));
        }
        if let Some(status) = request.status {
            update_data.insert("status".to_string(), json!(status));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        self.patch_window(window_id, Value::Object(update_data)).await
    }

    /// Soft delete: the row stays but no longer counts for bookings or overlaps.
    pub async fn deactivate_window(&self, window_id: i64) -> Result<AvailabilityWindow, AvailabilityError> {
        debug!("Deactivating availability window: {}", window_id);

        self.patch_window(window_id, json!({
            "status": WindowStatus::Inactive,
            "updated_at": Utc::now().to_rfc3339()
        })).await
    }

    pub async fn get_window(&self, window_id: i64) -> Result<Option<AvailabilityWindow>> {
        let path = format!("/rest/v1/availability_windows?id=eq.{}", window_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        Self::first_window(result)
    }

    pub async fn list_windows(&self, doctor_id: i64) -> Result<Vec<AvailabilityWindow>> {
        debug!("Fetching availability windows for doctor: {}", doctor_id);

        let path = format!(
            "/rest/v1/availability_windows?doctor_id=eq.{}&order=day_of_week.asc,start_time.asc",
            doctor_id
        );
        self.fetch_windows(&path).await
    }

    /// Whether an active window of this doctor covers `time` on `date`.
    pub async fn find_active_window(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<bool> {
        let windows = self.active_windows_for_day(doctor_id, day_of_week_index(date.weekday())).await?;

        Ok(windows.iter().any(|window| window.covers(date, time)))
    }

    pub async fn has_overlap(
        &self,
        doctor_id: i64,
        day_of_week: i32,
        specific_date: Option<NaiveDate>,
        start: NaiveTime,
        end: NaiveTime,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let windows = self.active_windows_for_day(doctor_id, day_of_week).await?;

        Ok(find_overlap(&windows, day_of_week, specific_date, start, end, exclude_id).is_some())
    }

    async fn active_windows_for_day(&self, doctor_id: i64, day_of_week: i32) -> Result<Vec<AvailabilityWindow>> {
        let path = format!(
            "/rest/v1/availability_windows?doctor_id=eq.{}&day_of_week=eq.{}&status=eq.active",
            doctor_id, day_of_week
        );
        self.fetch_windows(&path).await
    }

    async fn fetch_windows(&self, path: &str) -> Result<Vec<AvailabilityWindow>> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            None,
            None,
        ).await?;

        let windows = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<AvailabilityWindow>, _>>()?;

        Ok(windows)
    }

    async fn patch_window(&self, window_id: i64, body: Value) -> Result<AvailabilityWindow, AvailabilityError> {
        let path = format!("/rest/v1/availability_windows?id=eq.{}", window_id);
        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(body),
            Some(SupabaseClient::representation_headers()),
        ).await?;

        Self::first_window(result)?.ok_or(AvailabilityError::NotFound)
    }

    fn first_window(rows: Vec<Value>) -> Result<Option<AvailabilityWindow>> {
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }
}
