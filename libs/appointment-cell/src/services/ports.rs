use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use doctor_cell::{AvailabilityService, Doctor, DoctorService};
use patient_cell::{Patient, PatientService};

use crate::models::{Appointment, NewAppointment, StoreError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn exists(&self, patient_id: i64) -> Result<bool>;
    async fn get(&self, patient_id: i64) -> Result<Option<Patient>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn exists(&self, doctor_id: i64) -> Result<bool>;
    async fn get(&self, doctor_id: i64) -> Result<Option<Doctor>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Whether a slot-holding appointment of this doctor starts exactly at `at`.
    async fn exists_in_slot(
        &self,
        doctor_id: i64,
        at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<bool, StoreError>;
    async fn find_by_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, StoreError>;
    async fn find_by_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, StoreError>;
    async fn find_by_id(&self, appointment_id: i64) -> Result<Option<Appointment>, StoreError>;
    async fn add(&self, appointment: NewAppointment) -> Result<Appointment, StoreError>;
    async fn update(&self, appointment: Appointment) -> Result<Appointment, StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityLookup: Send + Sync {
    async fn find_active_window(&self, doctor_id: i64, date: NaiveDate, time: NaiveTime) -> Result<bool>;
    async fn has_overlap(
        &self,
        doctor_id: i64,
        day_of_week: i32,
        specific_date: Option<NaiveDate>,
        start: NaiveTime,
        end: NaiveTime,
        exclude_id: Option<i64>,
    ) -> Result<bool>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ==============================================================================
// SUPABASE-BACKED COLLABORATORS
// ==============================================================================

#[async_trait]
impl PatientDirectory for PatientService {
    async fn exists(&self, patient_id: i64) -> Result<bool> {
        self.patient_exists(patient_id).await
    }

    async fn get(&self, patient_id: i64) -> Result<Option<Patient>> {
        self.find_patient(patient_id).await
    }
}

#[async_trait]
impl DoctorDirectory for DoctorService {
    async fn exists(&self, doctor_id: i64) -> Result<bool> {
        self.doctor_exists(doctor_id).await
    }

    async fn get(&self, doctor_id: i64) -> Result<Option<Doctor>> {
        self.find_doctor(doctor_id).await
    }
}

#[async_trait]
impl AvailabilityLookup for AvailabilityService {
    async fn find_active_window(&self, doctor_id: i64, date: NaiveDate, time: NaiveTime) -> Result<bool> {
        AvailabilityService::find_active_window(self, doctor_id, date, time).await
    }

    async fn has_overlap(
        &self,
        doctor_id: i64,
        day_of_week: i32,
        specific_date: Option<NaiveDate>,
        start: NaiveTime,
        end: NaiveTime,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        AvailabilityService::has_overlap(self, doctor_id, day_of_week, specific_date, start, end, exclude_id).await
    }
}
