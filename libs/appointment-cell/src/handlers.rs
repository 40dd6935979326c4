use std::sync::Arc;

use axum::{
    extract::{Path, State, Extension},
    Json,
};
use tracing::debug;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_utils::extractor::require_staff;

use crate::models::{
    Appointment, BookAppointmentRequest, BookingError, CancelAppointmentRequest,
    RescheduleAppointmentRequest,
};
use crate::services::booking::BookingService;

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        AppError::rejected(error.status(), error.code(), error.to_string())
    }
}

// ==============================================================================
// APPOINTMENT BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(booking_service): State<Arc<BookingService>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<ApiResponse<Appointment>>, AppError> {
    debug!("User {} booking for patient {}", user.id, request.patient_id);

    let appointment = booking_service.create_appointment(request).await?;

    Ok(Json(ApiResponse::ok(appointment, "Appointment booked successfully")))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(booking_service): State<Arc<BookingService>>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<ApiResponse<Appointment>>, AppError> {
    let appointment = booking_service.get_appointment(appointment_id).await?;

    Ok(Json(ApiResponse::ok(appointment, "Appointment retrieved")))
}

// ==============================================================================
// APPOINTMENT LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(booking_service): State<Arc<BookingService>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<ApiResponse<Appointment>>, AppError> {
    require_staff(&user)?;

    let appointment = booking_service.confirm_appointment(appointment_id).await?;

    Ok(Json(ApiResponse::ok(appointment, "Appointment confirmed")))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(booking_service): State<Arc<BookingService>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    request: Option<Json<CancelAppointmentRequest>>,
) -> Result<Json<ApiResponse<Appointment>>, AppError> {
    debug!("User {} cancelling appointment {}", user.id, appointment_id);

    let reason = request.and_then(|Json(body)| body.reason);
    let appointment = booking_service.cancel_appointment(appointment_id, reason).await?;

    Ok(Json(ApiResponse::ok(appointment, "Appointment cancelled successfully")))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(booking_service): State<Arc<BookingService>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<ApiResponse<Appointment>>, AppError> {
    debug!("User {} rescheduling appointment {}", user.id, appointment_id);

    let appointment = booking_service
        .reschedule_appointment(appointment_id, request.new_date)
        .await?;

    Ok(Json(ApiResponse::ok(appointment, "Appointment rescheduled successfully")))
}

// ==============================================================================
// APPOINTMENT LISTING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(booking_service): State<Arc<BookingService>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Appointment>>>, AppError> {
    require_staff(&user)?;

    let appointments = booking_service.list_patient_appointments(patient_id).await?;

    Ok(Json(ApiResponse::ok(appointments, "Patient appointments retrieved")))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(booking_service): State<Arc<BookingService>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Appointment>>>, AppError> {
    require_staff(&user)?;

    let appointments = booking_service.list_doctor_appointments(doctor_id).await?;

    Ok(Json(ApiResponse::ok(appointments, "Doctor appointments retrieved")))
}
