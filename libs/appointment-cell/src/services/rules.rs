use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::debug;

use crate::models::{BookingError, BookingRules};

impl BookingRules {
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.clinic_offset).date_naive()
    }

    pub fn same_local_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.local_date(a) == self.local_date(b)
    }

    pub fn validate_ids(&self, patient_id: i64, doctor_id: i64) -> Result<(), BookingError> {
        if patient_id <= 0 {
            return Err(BookingError::InvalidInput(format!("patient_id must be positive, got {}", patient_id)));
        }
        if doctor_id <= 0 {
            return Err(BookingError::InvalidInput(format!("doctor_id must be positive, got {}", doctor_id)));
        }
        Ok(())
    }

    /// `at` must lie strictly after `now + min_lead_time`.
    pub fn check_lead_time(&self, now: DateTime<Utc>, at: DateTime<Utc>) -> Result<(), BookingError> {
        if at <= now + self.min_lead_time {
            return Err(BookingError::TooSoon(self.min_lead_time.num_minutes()));
        }
        Ok(())
    }

    pub fn check_business_hours(&self, at: DateTime<Utc>) -> Result<(), BookingError> {
        let local_time = at.with_timezone(&self.clinic_offset).time();

        if local_time < self.opening_time || local_time > self.closing_time {
            return Err(BookingError::OutsideBusinessHours {
                opening: self.opening_time,
                closing: self.closing_time,
            });
        }
        Ok(())
    }

    pub fn check_open_day(&self, at: DateTime<Utc>) -> Result<(), BookingError> {
        if self.local_date(at).weekday() == self.closed_day {
            return Err(BookingError::ClosedDay(self.closed_day));
        }
        Ok(())
    }

    /// Shape and calendar checks that need no lookups, in booking order.
    pub fn validate_booking_slot(
        &self,
        now: DateTime<Utc>,
        patient_id: i64,
        doctor_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        debug!("Validating slot {} for patient {} with doctor {}", at, patient_id, doctor_id);

        self.validate_ids(patient_id, doctor_id)?;
        self.check_lead_time(now, at)?;
        self.check_business_hours(at)?;
        self.check_open_day(at)
    }

    pub fn check_cancellation_window(&self, now: DateTime<Utc>, at: DateTime<Utc>) -> Result<(), BookingError> {
        if !self.enforce_cancellation_window {
            return Ok(());
        }
        if at - now < self.cancellation_window {
            return Err(BookingError::CancellationWindowExpired(self.cancellation_window.num_hours()));
        }
        Ok(())
    }
}
