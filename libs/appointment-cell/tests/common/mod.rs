#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use appointment_cell::{
    Appointment, AppointmentEvent, AppointmentNotifier, AppointmentStatus, AppointmentStore,
    AvailabilityLookup, BookingCollaborators, BookingRules, BookingService, DoctorDirectory,
    FixedClock, NewAppointment, PatientDirectory, StoreError,
};
use doctor_cell::{find_overlap, AvailabilityWindow, Doctor, WindowStatus};
use patient_cell::Patient;

pub const PATIENT: i64 = 1;
pub const OTHER_PATIENT: i64 = 3;
pub const DOCTOR: i64 = 2;
pub const OTHER_DOCTOR: i64 = 4;

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

/// Monday 2026-10-19 09:00 UTC.
pub fn now() -> DateTime<Utc> {
    utc(2026, 10, 19, 9, 0)
}

/// Tuesday 10:00, the day after `now()`.
pub fn tomorrow_ten() -> DateTime<Utc> {
    utc(2026, 10, 20, 10, 0)
}

/// Patients, doctors, windows and appointments held in memory.
pub struct InMemoryClinic {
    patients: HashSet<i64>,
    doctors: HashSet<i64>,
    windows: Mutex<Vec<AvailabilityWindow>>,
    appointments: Mutex<Vec<Appointment>>,
    next_id: AtomicI64,
}

impl InMemoryClinic {
    /// Patients 1 and 3, doctors 2 and 4, both doctors available Mon-Fri 08:00-17:00.
    pub fn new() -> Arc<Self> {
        let clinic = Self {
            patients: [PATIENT, OTHER_PATIENT].into_iter().collect(),
            doctors: [DOCTOR, OTHER_DOCTOR].into_iter().collect(),
            windows: Mutex::new(Vec::new()),
            appointments: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        };
        for doctor_id in [DOCTOR, OTHER_DOCTOR] {
            for day_of_week in 1..=5 {
                clinic.add_window(doctor_id, day_of_week, 8, 17);
            }
        }
        Arc::new(clinic)
    }

    pub fn add_window(&self, doctor_id: i64, day_of_week: i32, start_hour: u32, end_hour: u32) {
        let mut windows = self.windows.lock().unwrap();
        let id = windows.len() as i64 + 1;
        windows.push(AvailabilityWindow {
            id,
            doctor_id,
            day_of_week,
            specific_date: None,
            start_time: NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end_hour, 0, 0).unwrap(),
            status: WindowStatus::Active,
        });
    }

    pub fn seed(&self, patient_id: i64, doctor_id: i64, at: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
        let mut new = NewAppointment::scheduled(patient_id, doctor_id, at, now());
        new.status = status;
        let appointment = new.into_appointment(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.appointments.lock().unwrap().push(appointment.clone());
        appointment
    }

    pub fn stored(&self, appointment_id: i64) -> Appointment {
        self.appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == appointment_id)
            .cloned()
            .unwrap()
    }

    pub fn count(&self) -> usize {
        self.appointments.lock().unwrap().len()
    }
}

#[async_trait]
impl PatientDirectory for InMemoryClinic {
    async fn exists(&self, patient_id: i64) -> Result<bool> {
        Ok(self.patients.contains(&patient_id))
    }

    async fn get(&self, patient_id: i64) -> Result<Option<Patient>> {
        Ok(self.patients.contains(&patient_id).then(|| Patient {
            id: patient_id,
            first_name: "Test".to_string(),
            last_name: "Patient".to_string(),
            email: None,
            phone_number: None,
            created_at: None,
        }))
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryClinic {
    async fn exists(&self, doctor_id: i64) -> Result<bool> {
        Ok(self.doctors.contains(&doctor_id))
    }

    async fn get(&self, doctor_id: i64) -> Result<Option<Doctor>> {
        Ok(self.doctors.contains(&doctor_id).then(|| Doctor {
            id: doctor_id,
            first_name: "Test".to_string(),
            last_name: "Doctor".to_string(),
            specialty: None,
            is_active: true,
        }))
    }
}

#[async_trait]
impl AvailabilityLookup for InMemoryClinic {
    async fn find_active_window(&self, doctor_id: i64, date: NaiveDate, time: NaiveTime) -> Result<bool> {
        Ok(self.windows
            .lock()
            .unwrap()
            .iter()
            .any(|w| w.doctor_id == doctor_id && w.covers(date, time)))
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
        let windows: Vec<AvailabilityWindow> = self.windows
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.doctor_id == doctor_id)
            .cloned()
            .collect();
        Ok(find_overlap(&windows, day_of_week, specific_date, start, end, exclude_id).is_some())
    }
}

#[async_trait]
impl AppointmentStore for InMemoryClinic {
    async fn exists_in_slot(
        &self,
        doctor_id: i64,
        at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<bool, StoreError> {
        // Give concurrent bookings a chance to interleave between check and insert
        tokio::task::yield_now().await;

        Ok(self.appointments.lock().unwrap().iter().any(|a| {
            a.doctor_id == doctor_id
                && a.appointment_date == at
                && a.status.holds_slot()
                && Some(a.id) != exclude_id
        }))
    }

    async fn find_by_patient(&self, patient_id: i64) -> Result<Vec<Appointment>, StoreError> {
        Ok(self.appointments.lock().unwrap().iter().filter(|a| a.patient_id == patient_id).cloned().collect())
    }

    async fn find_by_doctor(&self, doctor_id: i64) -> Result<Vec<Appointment>, StoreError> {
        Ok(self.appointments.lock().unwrap().iter().filter(|a| a.doctor_id == doctor_id).cloned().collect())
    }

    async fn find_by_id(&self, appointment_id: i64) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.lock().unwrap().iter().find(|a| a.id == appointment_id).cloned())
    }

    async fn add(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        tokio::task::yield_now().await;

        let appointment = appointment.into_appointment(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.appointments.lock().unwrap().push(appointment.clone());
        Ok(appointment)
    }

    async fn update(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut appointments = self.appointments.lock().unwrap();
        let slot = appointments
            .iter_mut()
            .find(|a| a.id == appointment.id)
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("no appointment {}", appointment.id)))?;
        *slot = appointment.clone();
        Ok(appointment)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(AppointmentEvent, i64)>>,
}

#[async_trait]
impl AppointmentNotifier for RecordingNotifier {
    async fn notify(&self, event: AppointmentEvent, appointment: Appointment) -> Result<()> {
        self.events.lock().unwrap().push((event, appointment.id));
        Ok(())
    }
}

pub fn booking_service(clinic: &Arc<InMemoryClinic>, notifier: Arc<RecordingNotifier>, rules: BookingRules) -> BookingService {
    BookingService::from_parts(
        BookingCollaborators {
            patients: clinic.clone(),
            doctors: clinic.clone(),
            appointments: clinic.clone(),
            availability: clinic.clone(),
            notifier,
            clock: Arc::new(FixedClock(now())),
        },
        rules,
    )
}

pub fn default_service(clinic: &Arc<InMemoryClinic>) -> BookingService {
    booking_service(clinic, Arc::new(RecordingNotifier::default()), BookingRules::default())
}
