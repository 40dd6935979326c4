use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use doctor_cell::{AvailabilityService, DoctorService};
use patient_cell::PatientService;
use shared_config::AppConfig;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, BookingError, BookingRules,
    NewAppointment, StoreError,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::locks::SlotLocks;
use crate::services::notifications::{AppointmentEvent, AppointmentNotifier, LogNotifier};
use crate::services::ports::{
    AppointmentStore, AvailabilityLookup, Clock, DoctorDirectory, PatientDirectory, SystemClock,
};
use crate::services::store::SupabaseAppointmentStore;

/// Everything the booking rules consult or write to.
pub struct BookingCollaborators {
    pub patients: Arc<dyn PatientDirectory>,
    pub doctors: Arc<dyn DoctorDirectory>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub availability: Arc<dyn AvailabilityLookup>,
    pub notifier: Arc<dyn AppointmentNotifier>,
    pub clock: Arc<dyn Clock>,
}

pub struct BookingService {
    patients: Arc<dyn PatientDirectory>,
    doctors: Arc<dyn DoctorDirectory>,
    appointments: Arc<dyn AppointmentStore>,
    availability: Arc<dyn AvailabilityLookup>,
    notifier: Arc<dyn AppointmentNotifier>,
    clock: Arc<dyn Clock>,
    rules: BookingRules,
    lifecycle_service: AppointmentLifecycleService,
    slot_locks: SlotLocks,
}

/// Logs the underlying failure and hands the caller the opaque variant.
fn internal(context: &str, err: impl Display) -> BookingError {
    error!("{}: {}", context, err);
    BookingError::Internal
}

fn store_failure(context: &str, err: StoreError) -> BookingError {
    match err {
        StoreError::SlotTaken => BookingError::DoctorBusy,
        StoreError::Backend(source) => internal(context, format!("{:#}", source)),
    }
}

impl BookingService {
    /// Supabase-backed service using the booking policy from `config`.
    pub fn new(config: &AppConfig) -> Self {
        Self::from_parts(
            BookingCollaborators {
                patients: Arc::new(PatientService::new(config)),
                doctors: Arc::new(DoctorService::new(config)),
                appointments: Arc::new(SupabaseAppointmentStore::new(config)),
                availability: Arc::new(AvailabilityService::new(config)),
                notifier: Arc::new(LogNotifier),
                clock: Arc::new(SystemClock),
            },
            BookingRules::from(&config.booking),
        )
    }

    pub fn from_parts(collaborators: BookingCollaborators, rules: BookingRules) -> Self {
        Self {
            patients: collaborators.patients,
            doctors: collaborators.doctors,
            appointments: collaborators.appointments,
            availability: collaborators.availability,
            notifier: collaborators.notifier,
            clock: collaborators.clock,
            rules,
            lifecycle_service: AppointmentLifecycleService::new(),
            slot_locks: SlotLocks::new(),
        }
    }

    // ==============================================================================
    // BOOKING
    // ==============================================================================

    pub async fn create_appointment(&self, request: BookAppointmentRequest) -> Result<Appointment, BookingError> {
        let BookAppointmentRequest { patient_id, doctor_id, appointment_date } = request;
        info!("Booking appointment for patient {} with doctor {} at {}", patient_id, doctor_id, appointment_date);

        let now = self.clock.now();
        self.rules
            .validate_booking_slot(now, patient_id, doctor_id, appointment_date)
            .inspect_err(|e| warn!("Booking rejected: {}", e))?;

        if !self.patients.exists(patient_id).await.map_err(|e| internal("Patient lookup failed", e))? {
            return Err(BookingError::PatientNotFound);
        }
        if !self.doctors.exists(doctor_id).await.map_err(|e| internal("Doctor lookup failed", e))? {
            return Err(BookingError::DoctorNotFound);
        }

        self.ensure_within_availability(doctor_id, appointment_date).await?;

        let _slot_guard = self.slot_locks.acquire(doctor_id).await;

        self.ensure_doctor_free(doctor_id, appointment_date, None).await?;
        self.ensure_patient_free(patient_id, appointment_date, None).await?;

        let appointment = self.appointments
            .add(NewAppointment::scheduled(patient_id, doctor_id, appointment_date, now))
            .await
            .map_err(|e| store_failure("Failed to store appointment", e))?;

        info!("Appointment {} booked for patient {} with doctor {}", appointment.id, patient_id, doctor_id);
        self.notify(AppointmentEvent::Booked, &appointment).await;

        Ok(appointment)
    }

    // ==============================================================================
    // STATE TRANSITIONS
    // ==============================================================================

    pub async fn confirm_appointment(&self, appointment_id: i64) -> Result<Appointment, BookingError> {
        let mut appointment = self.get_appointment(appointment_id).await?;
        self.lifecycle_service.ensure_can_confirm(appointment.status)?;

        appointment.status = AppointmentStatus::Confirmed;
        appointment.updated_at = self.clock.now();

        let confirmed = self.appointments
            .update(appointment)
            .await
            .map_err(|e| store_failure("Failed to confirm appointment", e))?;

        info!("Appointment {} confirmed", confirmed.id);
        self.notify(AppointmentEvent::Confirmed, &confirmed).await;

        Ok(confirmed)
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: i64,
        reason: Option<String>,
    ) -> Result<Appointment, BookingError> {
        let mut appointment = self.get_appointment(appointment_id).await?;
        self.lifecycle_service.ensure_can_cancel(appointment.status)?;

        let now = self.clock.now();
        self.rules
            .check_cancellation_window(now, appointment.appointment_date)
            .inspect_err(|e| warn!("Cancellation of appointment {} rejected: {}", appointment_id, e))?;

        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancellation_reason = reason.clone();
        appointment.updated_at = now;

        let cancelled = self.appointments
            .update(appointment)
            .await
            .map_err(|e| store_failure("Failed to cancel appointment", e))?;

        info!("Appointment {} cancelled", cancelled.id);
        self.notify(AppointmentEvent::Cancelled { reason }, &cancelled).await;

        Ok(cancelled)
    }

    /// Moves an appointment and resets it to Scheduled. The new slot must pass
    /// the same clinic-hour and same-day checks as a booking. On any failure
    /// the stored record is left as it was.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: i64,
        new_date: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let mut appointment = self.get_appointment(appointment_id).await?;
        self.lifecycle_service.ensure_can_reschedule(appointment.status)?;

        let now = self.clock.now();
        self.rules.check_lead_time(now, new_date)?;
        self.rules.check_business_hours(new_date)?;
        self.rules.check_open_day(new_date)?;
        self.ensure_within_availability(appointment.doctor_id, new_date).await?;

        let _slot_guard = self.slot_locks.acquire(appointment.doctor_id).await;
        self.ensure_doctor_free(appointment.doctor_id, new_date, Some(appointment.id)).await?;
        self.ensure_patient_free(appointment.patient_id, new_date, Some(appointment.id)).await?;

        let previous_date = appointment.appointment_date;
        appointment.appointment_date = new_date;
        appointment.status = AppointmentStatus::Scheduled;
        appointment.updated_at = now;

        let rescheduled = self.appointments
            .update(appointment)
            .await
            .map_err(|e| store_failure("Failed to reschedule appointment", e))?;

        info!("Appointment {} moved from {} to {}", rescheduled.id, previous_date, new_date);
        self.notify(AppointmentEvent::Rescheduled { previous_date }, &rescheduled).await;

        Ok(rescheduled)
    }

    // ==============================================================================
    // READS
    // ==============================================================================

    pub async fn get_appointment(&self, appointment_id: i64) -> Result<Appointment, BookingError> {
        if appointment_id <= 0 {
            return Err(BookingError::InvalidInput(format!(
                "appointment_id must be positive, got {}",
                appointment_id
            )));
        }

        self.appointments
            .find_by_id(appointment_id)
            .await
            .map_err(|e| store_failure("Appointment lookup failed", e))?
            .ok_or(BookingError::AppointmentNotFound)
    }

    pub async fn list_patient_appointments(&self, patient_id: i64) -> Result<Vec<Appointment>, BookingError> {
        debug!("Listing appointments for patient {}", patient_id);

        if !self.patients.exists(patient_id).await.map_err(|e| internal("Patient lookup failed", e))? {
            return Err(BookingError::PatientNotFound);
        }

        self.appointments
            .find_by_patient(patient_id)
            .await
            .map_err(|e| store_failure("Failed to list patient appointments", e))
    }

    pub async fn list_doctor_appointments(&self, doctor_id: i64) -> Result<Vec<Appointment>, BookingError> {
        debug!("Listing appointments for doctor {}", doctor_id);

        if !self.doctors.exists(doctor_id).await.map_err(|e| internal("Doctor lookup failed", e))? {
            return Err(BookingError::DoctorNotFound);
        }

        self.appointments
            .find_by_doctor(doctor_id)
            .await
            .map_err(|e| store_failure("Failed to list doctor appointments", e))
    }

    // ==============================================================================
    // CHECKS
    // ==============================================================================

    async fn ensure_within_availability(&self, doctor_id: i64, at: DateTime<Utc>) -> Result<(), BookingError> {
        if !self.rules.require_availability_window {
            return Ok(());
        }

        let local = at.with_timezone(&self.rules.clinic_offset);
        let available = self.availability
            .find_active_window(doctor_id, local.date_naive(), local.time())
            .await
            .map_err(|e| internal("Availability lookup failed", e))?;

        if !available {
            warn!("Doctor {} has no active window covering {}", doctor_id, local);
            return Err(BookingError::OutsideAvailability);
        }
        Ok(())
    }

    async fn ensure_doctor_free(
        &self,
        doctor_id: i64,
        at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<(), BookingError> {
        let taken = self.appointments
            .exists_in_slot(doctor_id, at, exclude_id)
            .await
            .map_err(|e| store_failure("Slot lookup failed", e))?;

        if taken {
            warn!("Doctor {} is already booked at {}", doctor_id, at);
            return Err(BookingError::DoctorBusy);
        }
        Ok(())
    }

    async fn ensure_patient_free(
        &self,
        patient_id: i64,
        at: DateTime<Utc>,
        exclude_id: Option<i64>,
    ) -> Result<(), BookingError> {
        let existing = self.appointments
            .find_by_patient(patient_id)
            .await
            .map_err(|e| store_failure("Patient appointment lookup failed", e))?;

        let double_booked = existing.iter().any(|appointment| {
            Some(appointment.id) != exclude_id
                && appointment.status.holds_slot()
                && self.rules.same_local_day(appointment.appointment_date, at)
        });

        if double_booked {
            warn!("Patient {} already has an appointment on {}", patient_id, self.rules.local_date(at));
            return Err(BookingError::PatientDoubleBooked);
        }
        Ok(())
    }

    async fn notify(&self, event: AppointmentEvent, appointment: &Appointment) {
        if let Err(e) = self.notifier.notify(event, appointment.clone()).await {
            warn!("Notification for appointment {} failed: {:#}", appointment.id, e);
        }
    }
}
