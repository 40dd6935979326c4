use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::{is_conflict, SupabaseClient};

use crate::models::{Appointment, AppointmentStatus, NewAppointment, StoreError};
use crate::services::ports::AppointmentStore;

/// PostgREST-backed appointment table.
///
/// Expects a partial unique index on `(doctor_id, appointment_date)` for rows
/// whose status is not `cancelled`; a violation surfaces as [`StoreError::SlotTaken`].
pub struct SupabaseAppointmentStore {
    supabase: SupabaseClient,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn timestamp_param(at: DateTime<Utc>) -> String {
        urlencoding::encode(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true)).into_owned()
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Appointment>, StoreError> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            None,
            None,
        ).await?;

        let appointments = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(anyhow::Error::from)?;

        Ok(appointments)
    }

    fn map_write_error(err: anyhow::Error) -> StoreError {
        if is_conflict(&err) {
            warn!("Appointment write rejected by slot constraint");
            StoreError::SlotTaken
        } else {
            StoreError::Backend(err)
        }
    }

    fn first_row(rows: Vec<Value>) -> Result<Appointment, StoreError> {
        let row = rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("Appointment write returned no rows"))?;

        Ok(serde_json::from_value(row).map_err(anyhow::Error::from)?)
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn exists_in_slot(
        &self,
        doctor_id: i64,
        at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<bool, StoreError> {
        debug!("Checking slot {} for doctor {}", at, doctor_id);

        let mut path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&status=neq.{}&select=id",
            doctor_id,
            Self::timestamp_param(at),
            AppointmentStatus::Cancelled
        );
        if let Some(exclude_id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", exclude_id));
        }

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        Ok(!result.is_empty())
    }

    async fn find_by_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=appointment_date.asc",
            patient_id
        );
        self.fetch(&path).await
    }

    async fn find_by_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=appointment_date.asc",
            doctor_id
        );
        self.fetch(&path).await
    }

    async fn find_by_id(&self, appointment_id: i64) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn add(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let body = serde_json::to_value(&appointment).map_err(anyhow::Error::from)?;

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            None,
            Some(body),
            Some(SupabaseClient::representation_headers()),
        ).await.map_err(Self::map_write_error)?;

        Self::first_row(result)
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
        let body = json!({
            "appointment_date": appointment.appointment_date,
            "status": appointment.status,
            "cancellation_reason": appointment.cancellation_reason,
            "updated_at": appointment.updated_at,
        });

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            None,
            Some(body),
            Some(SupabaseClient::representation_headers()),
        ).await.map_err(Self::map_write_error)?;

        Self::first_row(result)
    }
}
