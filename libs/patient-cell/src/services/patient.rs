use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Patient, PatientError};

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Look a patient up by id. `Ok(None)` when no row matches.
    pub async fn find_patient(&self, patient_id: i64) -> Result<Option<Patient>> {
        debug!("Fetching patient: {}", patient_id);

        let path = format!(
            "/rest/v1/patients?id=eq.{}&select=id,first_name,last_name,email,phone_number,created_at",
            patient_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        match result.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_patient(&self, patient_id: i64) -> Result<Patient, PatientError> {
        if patient_id <= 0 {
            return Err(PatientError::InvalidId(patient_id));
        }

        self.find_patient(patient_id)
            .await?
            .ok_or(PatientError::NotFound)
    }

    pub async fn patient_exists(&self, patient_id: i64) -> Result<bool> {
        debug!("Checking patient existence: {}", patient_id);

        let path = format!("/rest/v1/patients?id=eq.{}&select=id", patient_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
            None,
        ).await?;

        Ok(!result.is_empty())
    }
}
