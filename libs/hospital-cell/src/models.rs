use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hospital {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub daily_capacity: u32,
    pub booked_count: u32,
    pub free_slot_date: NaiveDate,
    #[serde(default)]
    pub rating_average: f64,
    #[serde(default)]
    pub rating_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hospital {
    pub fn slot_state(&self) -> SlotState {
        SlotState {
            booked_count: self.booked_count,
            free_slot_date: self.free_slot_date,
        }
    }
}

/// The two columns the appointment allocator reads and writes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotState {
    pub booked_count: u32,
    pub free_slot_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHospitalRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub daily_capacity: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HospitalSearchFilters {
    pub name: Option<String>,
    pub city: Option<String>,
    pub speciality_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyHospital {
    #[serde(flatten)]
    pub hospital: Hospital,
    pub distance_km: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum HospitalError {
    #[error("Hospital not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for HospitalError {
    fn from(err: anyhow::Error) -> Self {
        if shared_database::supabase::is_not_found(&err) {
            HospitalError::NotFound
        } else {
            HospitalError::Database(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HospitalError {
    fn from(err: serde_json::Error) -> Self {
        HospitalError::Database(format!("Malformed hospital row: {}", err))
    }
}

impl From<HospitalError> for AppError {
    fn from(err: HospitalError) -> Self {
        match err {
            HospitalError::NotFound => AppError::NotFound(err.to_string()),
            HospitalError::Validation(msg) => AppError::ValidationError(msg),
            HospitalError::Database(msg) => AppError::Database(msg),
        }
    }
}
