use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Patient identity as seen by the booking rules. Clinical fields live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Invalid patient id: {0}")]
    InvalidId(i64),

    #[error("Database error: {0}")]
    DatabaseError(#[from] anyhow::Error),
}
