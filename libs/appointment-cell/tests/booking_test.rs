mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Weekday};

use appointment_cell::{
    AppointmentEvent, AppointmentStatus, BookAppointmentRequest, BookingError, BookingRules,
};
use common::*;

fn request(patient_id: i64, doctor_id: i64, at: chrono::DateTime<chrono::Utc>) -> BookAppointmentRequest {
    BookAppointmentRequest { patient_id, doctor_id, appointment_date: at }
}

// ==============================================================================
// BOOKING RULES
// ==============================================================================

#[tokio::test]
async fn test_booking_tomorrow_inside_window_is_scheduled() {
    let clinic = InMemoryClinic::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let service = booking_service(&clinic, notifier.clone(), BookingRules::default());

    let appointment = service.create_appointment(request(PATIENT, DOCTOR, tomorrow_ten())).await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.patient_id, PATIENT);
    assert_eq!(appointment.doctor_id, DOCTOR);
    assert_eq!(appointment.appointment_date, tomorrow_ten());
    assert_eq!(clinic.count(), 1);
    assert_eq!(*notifier.events.lock().unwrap(), vec![(AppointmentEvent::Booked, appointment.id)]);
}

#[tokio::test]
async fn test_lead_time_rejects_anything_up_to_ten_minutes_out() {
    let clinic = InMemoryClinic::new();
    let service = default_service(&clinic);

    for offset in [Duration::zero(), Duration::minutes(5), Duration::minutes(10), -Duration::hours(3)] {
        assert_matches!(
            service.create_appointment(request(PATIENT, DOCTOR, now() + offset)).await,
            Err(BookingError::TooSoon(10))
        );
    }
    assert_eq!(clinic.count(), 0);
}

#[tokio::test]
async fn test_times_outside_business_hours_are_rejected() {
    let clinic = InMemoryClinic::new();
    // Evening window so only business hours can reject 20:30
    clinic.add_window(DOCTOR, 2, 17, 23);
    let service = default_service(&clinic);

    for (hour, minute) in [(7, 59), (20, 30), (22, 0), (6, 0)] {
        assert_matches!(
            service.create_appointment(request(PATIENT, DOCTOR, utc(2026, 10, 20, hour, minute))).await,
            Err(BookingError::OutsideBusinessHours { .. })
        );
    }
}

#[tokio::test]
async fn test_sunday_is_closed_regardless_of_time() {
    let clinic = InMemoryClinic::new();
    clinic.add_window(DOCTOR, 0, 8, 20);
    let service = default_service(&clinic);

    for hour in [8, 10, 15, 20] {
        assert_matches!(
            service.create_appointment(request(PATIENT, DOCTOR, utc(2026, 10, 25, hour, 0))).await,
            Err(BookingError::ClosedDay(Weekday::Sun))
        );
    }
}

#[tokio::test]
async fn test_unknown_patient_and_doctor() {
    let clinic = InMemoryClinic::new();
    let service = default_service(&clinic);

    assert_matches!(
        service.create_appointment(request(77, DOCTOR, tomorrow_ten())).await,
        Err(BookingError::PatientNotFound)
    );
    assert_matches!(
        service.create_appointment(request(PATIENT, 77, tomorrow_ten())).await,
        Err(BookingError::DoctorNotFound)
    );
    assert_matches!(
        service.create_appointment(request(-1, DOCTOR, tomorrow_ten())).await,
        Err(BookingError::InvalidInput(_))
    );
}

#[tokio::test]
async fn test_booking_outside_doctor_window() {
    let clinic = InMemoryClinic::new();
    let service = default_service(&clinic);

    // Windows end at 17:00 (exclusive)
    assert_matches!(
        service.create_appointment(request(PATIENT, DOCTOR, utc(2026, 10, 20, 17, 0))).await,
        Err(BookingError::OutsideAvailability)
    );
    // Saturday is open but the doctor has no window
    assert_matches!(
        service.create_appointment(request(PATIENT, DOCTOR, utc(2026, 10, 24, 10, 0))).await,
        Err(BookingError::OutsideAvailability)
    );
}

#[tokio::test]
async fn test_availability_check_can_be_disabled() {
    let clinic = InMemoryClinic::new();
    let rules = BookingRules {
        require_availability_window: false,
        ..BookingRules::default()
    };
    let service = booking_service(&clinic, Arc::new(RecordingNotifier::default()), rules);

    let appointment = service
        .create_appointment(request(PATIENT, DOCTOR, utc(2026, 10, 20, 18, 0)))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn test_same_doctor_same_time_twice_is_busy() {
    let clinic = InMemoryClinic::new();
    let service = default_service(&clinic);

    service.create_appointment(request(PATIENT, DOCTOR, tomorrow_ten())).await.unwrap();

    assert_matches!(
        service.create_appointment(request(PATIENT, DOCTOR, tomorrow_ten())).await,
        Err(BookingError::DoctorBusy)
    );
    assert_matches!(
        service.create_appointment(request(OTHER_PATIENT, DOCTOR, tomorrow_ten())).await,
        Err(BookingError::DoctorBusy)
    );
    assert_eq!(clinic.count(), 1);
}

#[tokio::test]
async fn test_cancelled_booking_frees_the_slot() {
    let clinic = InMemoryClinic::new();
    clinic.seed(PATIENT, DOCTOR, tomorrow_ten(), AppointmentStatus::Cancelled);
    let service = default_service(&clinic);

    let appointment = service
        .create_appointment(request(OTHER_PATIENT, DOCTOR, tomorrow_ten()))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn test_patient_cannot_hold_two_appointments_on_one_day() {
    let clinic = InMemoryClinic::new();
    let service = default_service(&clinic);

    service.create_appointment(request(PATIENT, DOCTOR, tomorrow_ten())).await.unwrap();

    assert_matches!(
        service.create_appointment(request(PATIENT, OTHER_DOCTOR, utc(2026, 10, 20, 14, 0))).await,
        Err(BookingError::PatientDoubleBooked)
    );
    // Next day is fine
    service
        .create_appointment(request(PATIENT, OTHER_DOCTOR, utc(2026, 10, 21, 14, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cancelled_same_day_does_not_double_book() {
    let clinic = InMemoryClinic::new();
    clinic.seed(PATIENT, DOCTOR, tomorrow_ten(), AppointmentStatus::Cancelled);
    let service = default_service(&clinic);

    let appointment = service
        .create_appointment(request(PATIENT, OTHER_DOCTOR, utc(2026, 10, 20, 14, 0)))
        .await
        .unwrap();

    assert_eq!(appointment.patient_id, PATIENT);
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_for_one_slot_admit_exactly_one() {
    let clinic = InMemoryClinic::new();
    let service = Arc::new(default_service(&clinic));

    let attempts: Vec<_> = [PATIENT, OTHER_PATIENT]
        .into_iter()
        .map(|patient_id| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service.create_appointment(request(patient_id, DOCTOR, tomorrow_ten())).await
            })
        })
        .collect();

    let mut booked = 0;
    let mut busy = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => booked += 1,
            Err(BookingError::DoctorBusy) => busy += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!((booked, busy), (1, 1));
    assert_eq!(clinic.count(), 1);
}

// ==============================================================================
// STATE TRANSITIONS
// ==============================================================================

#[tokio::test]
async fn test_confirm_then_confirm_again() {
    let clinic = InMemoryClinic::new();
    let service = default_service(&clinic);
    let booked = service.create_appointment(request(PATIENT, DOCTOR, tomorrow_ten())).await.unwrap();

    let confirmed = service.confirm_appointment(booked.id).await.unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
    assert_eq!(clinic.stored(booked.id).status, AppointmentStatus::Confirmed);

    assert_matches!(
        service.confirm_appointment(booked.id).await,
        Err(BookingError::InvalidTransition(_))
    );
}

#[tokio::test]
async fn test_cancel_guards_terminal_states() {
    let clinic = InMemoryClinic::new();
    let cancelled = clinic.seed(PATIENT, DOCTOR, now() + Duration::days(3), AppointmentStatus::Cancelled);
    let completed = clinic.seed(PATIENT, DOCTOR, now() + Duration::days(4), AppointmentStatus::Completed);
    let service = default_service(&clinic);

    assert_matches!(
        service.cancel_appointment(cancelled.id, None).await,
        Err(BookingError::AlreadyCancelled)
    );
    assert_matches!(
        service.cancel_appointment(completed.id, None).await,
        Err(BookingError::AlreadyCompleted)
    );
}

#[tokio::test]
async fn test_cancel_confirmed_appointment_then_again() {
    let clinic = InMemoryClinic::new();
    let confirmed = clinic.seed(PATIENT, DOCTOR, now() + Duration::days(2), AppointmentStatus::Confirmed);
    let service = default_service(&clinic);

    let cancelled = service.cancel_appointment(confirmed.id, Some("feeling better".to_string())).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(clinic.stored(confirmed.id).cancellation_reason.as_deref(), Some("feeling better"));

    assert_matches!(
        service.cancel_appointment(confirmed.id, None).await,
        Err(BookingError::AlreadyCancelled)
    );
}

#[tokio::test]
async fn test_cancel_twenty_hours_ahead_is_too_late() {
    let clinic = InMemoryClinic::new();
    let soon = clinic.seed(PATIENT, DOCTOR, now() + Duration::hours(20), AppointmentStatus::Scheduled);
    let service = default_service(&clinic);

    assert_matches!(
        service.cancel_appointment(soon.id, None).await,
        Err(BookingError::CancellationWindowExpired(24))
    );
    assert_eq!(clinic.stored(soon.id).status, AppointmentStatus::Scheduled);

    let relaxed = booking_service(
        &clinic,
        Arc::new(RecordingNotifier::default()),
        BookingRules { enforce_cancellation_window: false, ..BookingRules::default() },
    );
    let cancelled = relaxed.cancel_appointment(soon.id, None).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_reschedule_outside_window_leaves_record_untouched() {
    let clinic = InMemoryClinic::new();
    let original = clinic.seed(PATIENT, DOCTOR, tomorrow_ten(), AppointmentStatus::Scheduled);
    let service = default_service(&clinic);

    assert_matches!(
        service.reschedule_appointment(original.id, utc(2026, 10, 20, 18, 0)).await,
        Err(BookingError::OutsideAvailability)
    );
    assert_eq!(clinic.stored(original.id), original);
}

#[tokio::test]
async fn test_reschedule_onto_busy_slot_leaves_record_untouched() {
    let clinic = InMemoryClinic::new();
    let original = clinic.seed(PATIENT, DOCTOR, tomorrow_ten(), AppointmentStatus::Scheduled);
    clinic.seed(OTHER_PATIENT, DOCTOR, utc(2026, 10, 21, 11, 0), AppointmentStatus::Confirmed);
    let service = default_service(&clinic);

    assert_matches!(
        service.reschedule_appointment(original.id, utc(2026, 10, 21, 11, 0)).await,
        Err(BookingError::DoctorBusy)
    );
    assert_eq!(clinic.stored(original.id).appointment_date, tomorrow_ten());
}

#[tokio::test]
async fn test_reschedule_resets_confirmed_to_scheduled() {
    let clinic = InMemoryClinic::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let original = clinic.seed(PATIENT, DOCTOR, tomorrow_ten(), AppointmentStatus::Confirmed);
    let service = booking_service(&clinic, notifier.clone(), BookingRules::default());

    let moved = service.reschedule_appointment(original.id, utc(2026, 10, 22, 10, 0)).await.unwrap();

    assert_eq!(moved.status, AppointmentStatus::Scheduled);
    assert_eq!(moved.appointment_date, utc(2026, 10, 22, 10, 0));
    assert_eq!(moved.updated_at, now());
    assert_eq!(
        *notifier.events.lock().unwrap(),
        vec![(AppointmentEvent::Rescheduled { previous_date: tomorrow_ten() }, original.id)]
    );
}

#[tokio::test]
async fn test_reschedule_rules() {
    let clinic = InMemoryClinic::new();
    let cancelled = clinic.seed(PATIENT, DOCTOR, tomorrow_ten(), AppointmentStatus::Cancelled);
    let active = clinic.seed(OTHER_PATIENT, DOCTOR, utc(2026, 10, 21, 9, 0), AppointmentStatus::Scheduled);
    let service = default_service(&clinic);

    assert_matches!(
        service.reschedule_appointment(cancelled.id, utc(2026, 10, 22, 10, 0)).await,
        Err(BookingError::InvalidTransition(_))
    );
    assert_matches!(
        service.reschedule_appointment(active.id, now() + Duration::minutes(5)).await,
        Err(BookingError::TooSoon(_))
    );
    // Same slot as itself is not a conflict
    let same = service.reschedule_appointment(active.id, utc(2026, 10, 21, 9, 0)).await.unwrap();
    assert_eq!(same.id, active.id);
    assert_matches!(
        service.reschedule_appointment(999, tomorrow_ten()).await,
        Err(BookingError::AppointmentNotFound)
    );
}

#[tokio::test]
async fn test_reschedule_applies_clinic_hours_and_patient_day() {
    let clinic = InMemoryClinic::new();
    let original = clinic.seed(PATIENT, DOCTOR, tomorrow_ten(), AppointmentStatus::Scheduled);
    clinic.seed(PATIENT, OTHER_DOCTOR, utc(2026, 10, 22, 9, 0), AppointmentStatus::Scheduled);
    let rules = BookingRules {
        require_availability_window: false,
        ..BookingRules::default()
    };
    let service = booking_service(&clinic, Arc::new(RecordingNotifier::default()), rules);

    assert_matches!(
        service.reschedule_appointment(original.id, utc(2026, 10, 25, 3, 0)).await,
        Err(BookingError::OutsideBusinessHours { .. })
    );
    assert_matches!(
        service.reschedule_appointment(original.id, utc(2026, 10, 25, 10, 0)).await,
        Err(BookingError::ClosedDay(Weekday::Sun))
    );
    assert_matches!(
        service.reschedule_appointment(original.id, utc(2026, 10, 22, 15, 0)).await,
        Err(BookingError::PatientDoubleBooked)
    );
    assert_eq!(clinic.stored(original.id), original);

    // Moving within its own day does not count against the patient
    let moved = service.reschedule_appointment(original.id, utc(2026, 10, 20, 15, 0)).await.unwrap();
    assert_eq!(moved.appointment_date, utc(2026, 10, 20, 15, 0));
}

// ==============================================================================
// READS
// ==============================================================================

#[tokio::test]
async fn test_listing_by_patient_and_doctor() {
    let clinic = InMemoryClinic::new();
    clinic.seed(PATIENT, DOCTOR, tomorrow_ten(), AppointmentStatus::Scheduled);
    clinic.seed(PATIENT, OTHER_DOCTOR, utc(2026, 10, 22, 9, 0), AppointmentStatus::Cancelled);
    clinic.seed(OTHER_PATIENT, DOCTOR, utc(2026, 10, 22, 9, 0), AppointmentStatus::Confirmed);
    let service = default_service(&clinic);

    assert_eq!(service.list_patient_appointments(PATIENT).await.unwrap().len(), 2);
    assert_eq!(service.list_doctor_appointments(DOCTOR).await.unwrap().len(), 2);
    assert_matches!(
        service.list_patient_appointments(77).await,
        Err(BookingError::PatientNotFound)
    );
    assert_matches!(
        service.list_doctor_appointments(77).await,
        Err(BookingError::DoctorNotFound)
    );
}
