use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use hospital_cell::models::HospitalError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Speciality {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub doctor_count: u32,
    #[serde(default)]
    pub hospital_count: u32,
    /// Severity buckets, e.g. `{"low": 3, "medium": 1, "high": 0}`.
    #[serde(default)]
    pub severity: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_key(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// One row of the hospital/speciality many-to-many table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HospitalLink {
    pub hospital_id: Uuid,
    pub speciality_id: Uuid,
    #[serde(default)]
    pub doctor_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalLinkRequest {
    pub hospital_id: Uuid,
    #[serde(default)]
    pub doctor_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpecialityRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub hospitals: Vec<HospitalLinkRequest>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SpecialityCounters {
    pub doctor_count: u32,
    pub hospital_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecialityDetail {
    #[serde(flatten)]
    pub speciality: Speciality,
    pub hospitals: Vec<HospitalLink>,
}

#[derive(Debug, thiserror::Error)]
pub enum SpecialityError {
    #[error("Speciality not found")]
    NotFound,

    #[error("Hospital {0} not found")]
    HospitalNotFound(Uuid),

    #[error("Speciality {0} already exists")]
    DuplicateName(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SpecialityError {
    fn from(err: anyhow::Error) -> Self {
        if shared_database::supabase::is_not_found(&err) {
            SpecialityError::NotFound
        } else {
            SpecialityError::Database(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SpecialityError {
    fn from(err: serde_json::Error) -> Self {
        SpecialityError::Database(format!("Malformed speciality row: {}", err))
    }
}

impl From<HospitalError> for SpecialityError {
    fn from(err: HospitalError) -> Self {
        match err {
            HospitalError::Validation(msg) => SpecialityError::Validation(msg),
            other => SpecialityError::Database(other.to_string()),
        }
    }
}

impl From<SpecialityError> for AppError {
    fn from(err: SpecialityError) -> Self {
        match err {
            SpecialityError::NotFound | SpecialityError::HospitalNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            SpecialityError::DuplicateName(_) => AppError::Conflict(err.to_string()),
            SpecialityError::Validation(msg) => AppError::ValidationError(msg),
            SpecialityError::Database(msg) => AppError::Database(msg),
        }
    }
}
