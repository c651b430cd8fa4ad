// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hospital_cell::models::HospitalError;
use shared_models::error::AppError;
use shared_utils::validation::validate_phone;
use speciality_cell::models::{Severity, SpecialityError};

pub const MAX_PATIENT_AGE: u32 = 150;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: String,
    pub hospital_id: Uuid,
    pub speciality_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_age: Option<u32>,
    pub description: Option<String>,
    pub severity: Severity,
    pub appointment_date: NaiveDate,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Booked,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub hospital_id: Uuid,
    pub speciality_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_age: Option<u32>,
    pub description: Option<String>,
    pub severity: Severity,
}

impl CreateAppointmentRequest {
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if self.patient_name.trim().is_empty() {
            return Err(AppointmentError::Validation("Patient name is required".to_string()));
        }
        if !validate_phone(&self.patient_phone) {
            return Err(AppointmentError::Validation(format!(
                "Invalid phone number: {}",
                self.patient_phone
            )));
        }
        if let Some(age) = self.patient_age {
            if age > MAX_PATIENT_AGE {
                return Err(AppointmentError::Validation(format!("Invalid patient age: {}", age)));
            }
        }
        if let Some(ref description) = self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(AppointmentError::Validation("Description is too long".to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub status: Option<AppointmentStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("Speciality not found")]
    SpecialityNotFound,

    #[error("Hospital does not offer the requested speciality")]
    SpecialityNotOffered,

    #[error("Hospital has no daily capacity")]
    NoCapacity,

    #[error("Could not reserve a slot after {0} attempts, please retry")]
    SlotContention(u32),

    #[error("Appointment is already {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        if shared_database::supabase::is_not_found(&err) {
            AppointmentError::NotFound
        } else {
            AppointmentError::Database(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppointmentError {
    fn from(err: serde_json::Error) -> Self {
        AppointmentError::Database(format!("Malformed appointment row: {}", err))
    }
}

impl From<HospitalError> for AppointmentError {
    fn from(err: HospitalError) -> Self {
        match err {
            HospitalError::NotFound => AppointmentError::HospitalNotFound,
            HospitalError::Validation(msg) => AppointmentError::Validation(msg),
            HospitalError::Database(msg) => AppointmentError::Database(msg),
        }
    }
}

impl From<SpecialityError> for AppointmentError {
    fn from(err: SpecialityError) -> Self {
        match err {
            SpecialityError::NotFound => AppointmentError::SpecialityNotFound,
            SpecialityError::Validation(msg) => AppointmentError::Validation(msg),
            other => AppointmentError::Database(other.to_string()),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::HospitalNotFound
            | AppointmentError::SpecialityNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::SpecialityNotOffered => AppError::BadRequest(err.to_string()),
            AppointmentError::NoCapacity
            | AppointmentError::SlotContention(_)
            | AppointmentError::InvalidStatusTransition(_) => AppError::Conflict(err.to_string()),
            AppointmentError::Unauthorized => AppError::Forbidden(err.to_string()),
            AppointmentError::Validation(msg) => AppError::ValidationError(msg),
            AppointmentError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            hospital_id: Uuid::new_v4(),
            speciality_id: Uuid::new_v4(),
            patient_name: "Aoife Byrne".to_string(),
            patient_phone: "+353 87 123 4567".to_string(),
            patient_age: Some(41),
            description: None,
            severity: Severity::Low,
        }
    }

    #[test]
    fn accepts_well_formed_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_blank_name_bad_phone_and_age() {
        let mut r = request();
        r.patient_name = "   ".to_string();
        assert!(r.validate().is_err());

        let mut r = request();
        r.patient_phone = "n/a".to_string();
        assert!(r.validate().is_err());

        let mut r = request();
        r.patient_age = Some(151);
        assert!(r.validate().is_err());
    }

    #[test]
    fn maps_contention_to_conflict() {
        let err: AppError = AppointmentError::SlotContention(3).into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = AppointmentError::Unauthorized.into();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
