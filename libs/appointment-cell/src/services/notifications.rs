use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::models::Appointment;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppointmentEvent {
    Booked,
    Confirmed,
    Cancelled { reason: Option<String> },
    Rescheduled { previous_date: DateTime<Utc> },
}

/// Delivery channel for appointment changes. Failures never undo the change.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentNotifier: Send + Sync {
    async fn notify(&self, event: AppointmentEvent, appointment: Appointment) -> Result<()>;
}

/// Writes events to the tracing log instead of contacting anyone.
pub struct LogNotifier;

#[async_trait]
impl AppointmentNotifier for LogNotifier {
    async fn notify(&self, event: AppointmentEvent, appointment: Appointment) -> Result<()> {
        info!(
            appointment_id = appointment.id,
            patient_id = appointment.patient_id,
            doctor_id = appointment.doctor_id,
            appointment_date = %appointment.appointment_date,
            "Appointment event: {:?}",
            event
        );
        Ok(())
    }
}
