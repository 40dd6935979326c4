use std::sync::Arc;
use axum::{
    extract::{Path, State, Extension},
    Json,
};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::response::ApiResponse;
use shared_utils::extractor::require_staff;

use crate::models::{
    AvailabilityError, AvailabilityWindow, CreateAvailabilityRequest, Doctor,
    UpdateAvailabilityRequest,
};
use crate::services::{AvailabilityService, DoctorService};

impl From<AvailabilityError> for AppError {
    fn from(error: AvailabilityError) -> Self {
        match error {
            AvailabilityError::InvalidTimeRange | AvailabilityError::InvalidDayOfWeek(_) => {
                AppError::ValidationError(error.to_string())
            }
            AvailabilityError::Overlap => AppError::Conflict(error.to_string()),
            AvailabilityError::NotFound => AppError::NotFound(error.to_string()),
            AvailabilityError::Database(source) => AppError::Database(source.to_string()),
        }
    }
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<ApiResponse<Doctor>>, AppError> {
    let doctor_service = DoctorService::new(&config);

    let doctor = doctor_service.find_doctor(doctor_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

    Ok(Json(ApiResponse::ok(doctor, "Doctor retrieved")))
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<AvailabilityWindow>>>, AppError> {
    let availability_service = AvailabilityService::new(&config);

    let windows = availability_service.list_windows(doctor_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(ApiResponse::ok(windows, "Availability retrieved")))
}

#[axum::debug_handler]
pub async fn create_availability(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
    Json(request): Json<CreateAvailabilityRequest>,
) -> Result<Json<ApiResponse<AvailabilityWindow>>, AppError> {
    require_staff(&user)?;

    let doctor_service = DoctorService::new(&config);
    if !doctor_service.doctor_exists(doctor_id).await.map_err(|e| AppError::Database(e.to_string()))? {
        return Err(AppError::NotFound("Doctor not found".to_string()));
    }

    let availability_service = AvailabilityService::new(&config);
    let window = availability_service.create_window(doctor_id, request).await?;

    Ok(Json(ApiResponse::ok(window, "Availability window created")))
}

#[axum::debug_handler]
pub async fn update_availability(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(window_id): Path<i64>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<ApiResponse<AvailabilityWindow>>, AppError> {
    require_staff(&user)?;

    let availability_service = AvailabilityService::new(&config);
    let window = availability_service.update_window(window_id, request).await?;

    Ok(Json(ApiResponse::ok(window, "Availability window updated")))
}

#[axum::debug_handler]
pub async fn deactivate_availability(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(window_id): Path<i64>,
) -> Result<Json<ApiResponse<AvailabilityWindow>>, AppError> {
    require_staff(&user)?;

    let availability_service = AvailabilityService::new(&config);
    let window = availability_service.deactivate_window(window_id).await?;

    Ok(Json(ApiResponse::ok(window, "Availability window deactivated")))
}
