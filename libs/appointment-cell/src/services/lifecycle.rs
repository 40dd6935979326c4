use tracing::{debug, warn};

use crate::models::{AppointmentStatus, BookingError};

pub struct AppointmentLifecycleService;

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Statuses reachable from `current` through confirm, cancel or reschedule.
    pub fn valid_transitions(&self, current: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current {
            AppointmentStatus::Scheduled => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Scheduled,
            ],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::Cancelled,
                AppointmentStatus::Scheduled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Cancelled
            | AppointmentStatus::Completed
            | AppointmentStatus::NoShow => &[],
        }
    }

    pub fn ensure_can_confirm(&self, current: AppointmentStatus) -> Result<(), BookingError> {
        debug!("Validating confirm from {}", current);

        if !self.valid_transitions(current).contains(&AppointmentStatus::Confirmed) {
            warn!("Rejected confirm of appointment in status {}", current);
            return Err(BookingError::InvalidTransition(
                "Only pending appointments can be confirmed".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ensure_can_cancel(&self, current: AppointmentStatus) -> Result<(), BookingError> {
        debug!("Validating cancel from {}", current);

        match current {
            AppointmentStatus::Cancelled => Err(BookingError::AlreadyCancelled),
            AppointmentStatus::Completed => Err(BookingError::AlreadyCompleted),
            _ if self.valid_transitions(current).contains(&AppointmentStatus::Cancelled) => Ok(()),
            _ => Err(BookingError::InvalidTransition(format!(
                "Cannot cancel a {} appointment",
                current
            ))),
        }
    }

    pub fn ensure_can_reschedule(&self, current: AppointmentStatus) -> Result<(), BookingError> {
        debug!("Validating reschedule from {}", current);

        if !self.valid_transitions(current).contains(&AppointmentStatus::Scheduled) {
            warn!("Rejected reschedule of appointment in status {}", current);
            return Err(BookingError::InvalidTransition(format!(
                "Cannot reschedule a {} appointment",
                current
            )));
        }
        Ok(())
    }
}
