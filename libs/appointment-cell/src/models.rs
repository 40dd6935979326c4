use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Offset, Utc, Weekday};
use std::fmt;
use axum::http::StatusCode;
use tracing::warn;

use shared_config::BookingPolicyConfig;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An appointment that has not been persisted yet; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewAppointment {
    pub fn scheduled(patient_id: i64, doctor_id: i64, appointment_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            patient_id,
            doctor_id,
            appointment_date,
            status: AppointmentStatus::Scheduled,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_appointment(self, id: i64) -> Appointment {
        Appointment {
            id,
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            appointment_date: self.appointment_date,
            status: self.status,
            cancellation_reason: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum AppointmentStatus {
    Scheduled = 1,
    Confirmed = 2,
    Cancelled = 3,
    Completed = 4,
    NoShow = 5,
}

impl AppointmentStatus {
    /// Cancelled appointments free their slot; every other status holds it.
    pub fn holds_slot(self) -> bool {
        self != AppointmentStatus::Cancelled
    }

    /// Nothing moves an appointment into Completed or NoShow yet. Once reached,
    /// no lifecycle operation applies.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: DateTime<Utc>,
}

// ==============================================================================
// BOOKING RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingRules {
    pub min_lead_time: Duration,
    /// Inclusive bounds on the local time of day.
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub closed_day: Weekday,
    pub cancellation_window: Duration,
    pub require_availability_window: bool,
    pub enforce_cancellation_window: bool,
    pub clinic_offset: FixedOffset,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self::from(&BookingPolicyConfig::default())
    }
}

impl From<&BookingPolicyConfig> for BookingRules {
    fn from(policy: &BookingPolicyConfig) -> Self {
        let opening_time = hour_or(policy.opening_hour, 8, "opening");
        let closing_time = hour_or(policy.closing_hour, 20, "closing");

        let clinic_offset = FixedOffset::east_opt(policy.clinic_utc_offset_minutes * 60)
            .unwrap_or_else(|| {
                warn!("Clinic UTC offset {} minutes is out of range, using UTC", policy.clinic_utc_offset_minutes);
                Utc.fix()
            });

        Self {
            min_lead_time: Duration::minutes(policy.min_lead_minutes),
            opening_time,
            closing_time,
            closed_day: Weekday::Sun,
            cancellation_window: Duration::hours(policy.cancellation_window_hours),
            require_availability_window: policy.require_availability_window,
            enforce_cancellation_window: policy.enforce_cancellation_window,
            clinic_offset,
        }
    }
}

fn hour_or(hour: u32, fallback: u32, label: &str) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0)
        .or_else(|| {
            warn!("Invalid {} hour {}, using {:02}:00", label, hour, fallback);
            NaiveTime::from_hms_opt(fallback, 0, 0)
        })
        .unwrap_or(NaiveTime::MIN)
}

// ==============================================================================
// ERROR MODELS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Appointments must be booked more than {0} minutes in advance")]
    TooSoon(i64),

    #[error("Appointments must be between {opening} and {closing}")]
    OutsideBusinessHours { opening: NaiveTime, closing: NaiveTime },

    #[error("The clinic is closed on {0}")]
    ClosedDay(Weekday),

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Doctor already has an appointment at this time")]
    DoctorBusy,

    #[error("Patient already has an appointment on this day")]
    PatientDoubleBooked,

    #[error("Doctor is not available at the requested time")]
    OutsideAvailability,

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Appointment is already completed")]
    AlreadyCompleted,

    #[error("Appointments can only be cancelled at least {0} hours in advance")]
    CancellationWindowExpired(i64),

    #[error("An unexpected error occurred. Please try again later.")]
    Internal,
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidInput(_) => "INVALID_INPUT",
            BookingError::TooSoon(_) => "TOO_SOON",
            BookingError::OutsideBusinessHours { .. } => "OUTSIDE_BUSINESS_HOURS",
            BookingError::ClosedDay(_) => "CLOSED_DAY",
            BookingError::PatientNotFound => "PATIENT_NOT_FOUND",
            BookingError::DoctorNotFound => "DOCTOR_NOT_FOUND",
            BookingError::AppointmentNotFound => "APPOINTMENT_NOT_FOUND",
            BookingError::DoctorBusy => "DOCTOR_BUSY",
            BookingError::PatientDoubleBooked => "PATIENT_DOUBLE_BOOKED",
            BookingError::OutsideAvailability => "OUTSIDE_AVAILABILITY",
            BookingError::InvalidTransition(_) => "INVALID_TRANSITION",
            BookingError::AlreadyCancelled => "ALREADY_CANCELLED",
            BookingError::AlreadyCompleted => "ALREADY_COMPLETED",
            BookingError::CancellationWindowExpired(_) => "CANCELLATION_WINDOW_EXPIRED",
            BookingError::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BookingError::InvalidInput(_)
            | BookingError::TooSoon(_)
            | BookingError::OutsideBusinessHours { .. }
            | BookingError::ClosedDay(_) => StatusCode::BAD_REQUEST,
            BookingError::PatientNotFound
            | BookingError::DoctorNotFound
            | BookingError::AppointmentNotFound => StatusCode::NOT_FOUND,
            BookingError::DoctorBusy
            | BookingError::PatientDoubleBooked
            | BookingError::OutsideAvailability
            | BookingError::InvalidTransition(_)
            | BookingError::AlreadyCancelled
            | BookingError::AlreadyCompleted => StatusCode::CONFLICT,
            BookingError::CancellationWindowExpired(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failures surfaced by an [`AppointmentStore`](crate::services::ports::AppointmentStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store refused the write because the doctor's slot is already held.
    #[error("Appointment slot already taken")]
    SlotTaken,

    #[error("Appointment store error: {0}")]
    Backend(#[from] anyhow::Error),
}
