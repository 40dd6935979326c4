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

use crate::models::{Patient, PatientError};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<ApiResponse<Patient>>, AppError> {
    require_staff(&user)?;

    let service = PatientService::new(&config);

    let patient = service.get_patient(patient_id)
        .await
        .map_err(|e| match e {
            PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
            PatientError::InvalidId(_) => AppError::ValidationError(e.to_string()),
            PatientError::DatabaseError(source) => AppError::Database(source.to_string()),
        })?;

    Ok(Json(ApiResponse::ok(patient, "Patient retrieved")))
}
