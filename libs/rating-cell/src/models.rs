use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hospital_cell::models::HospitalError;
use shared_models::error::AppError;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;
pub const MAX_REVIEW_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: String,
    pub hospital_id: Uuid,
    pub score: u8,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRatingRequest {
    pub hospital_id: Uuid,
    pub score: u8,
    pub review: Option<String>,
}

impl CreateRatingRequest {
    pub fn validate(&self) -> Result<(), RatingError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&self.score) {
            return Err(RatingError::Validation(format!(
                "Score must be between {} and {}",
                MIN_SCORE, MAX_SCORE
            )));
        }
        if let Some(ref review) = self.review {
            if review.chars().count() > MAX_REVIEW_LEN {
                return Err(RatingError::Validation("Review is too long".to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingSummary {
    pub count: u32,
    pub average: f64,
    /// Keyed "1" through "5".
    pub distribution: BTreeMap<String, u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("Rating not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for RatingError {
    fn from(err: anyhow::Error) -> Self {
        if shared_database::supabase::is_not_found(&err) {
            RatingError::NotFound
        } else {
            RatingError::Database(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RatingError {
    fn from(err: serde_json::Error) -> Self {
        RatingError::Database(format!("Malformed rating row: {}", err))
    }
}

impl From<HospitalError> for RatingError {
    fn from(err: HospitalError) -> Self {
        match err {
            HospitalError::NotFound => RatingError::HospitalNotFound,
            HospitalError::Validation(msg) => RatingError::Validation(msg),
            HospitalError::Database(msg) => RatingError::Database(msg),
        }
    }
}

impl From<RatingError> for AppError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::HospitalNotFound | RatingError::NotFound => {
                AppError::NotFound(err.to_string())
            }
            RatingError::Validation(msg) => AppError::ValidationError(msg),
            RatingError::Database(msg) => AppError::Database(msg),
        }
    }
}
