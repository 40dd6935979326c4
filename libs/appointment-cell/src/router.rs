use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, patch},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::booking::BookingService;

/// Appointment routes backed by Supabase, with rules taken from `config.booking`.
pub fn appointment_routes(config: Arc<AppConfig>) -> Router {
    let booking_service = Arc::new(BookingService::new(&config));
    appointment_routes_with(config, booking_service)
}

pub fn appointment_routes_with(config: Arc<AppConfig>, booking_service: Arc<BookingService>) -> Router {
    // All appointment operations require authentication
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/confirm", post(handlers::confirm_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/reschedule", patch(handlers::reschedule_appointment))
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_appointments))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(booking_service)
}
