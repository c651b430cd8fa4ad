use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use hospital_cell::services::HospitalService;
use shared_config::AppConfig;
use shared_database::supabase::{merge_duplicates, SupabaseClient};
use shared_models::auth::User;

use crate::models::{CreateRatingRequest, Rating, RatingError, RatingSummary};
use crate::services::summary::summarize;

pub struct RatingService {
    supabase: SupabaseClient,
    hospitals: HospitalService,
}

impl RatingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            hospitals: HospitalService::new(config),
        }
    }

    /// Record (or replace) the caller's rating of a hospital and refresh the
    /// hospital's stored average.
    pub async fn submit_rating(
        &self,
        user: &User,
        request: CreateRatingRequest,
        auth_token: &str,
    ) -> Result<(Rating, RatingSummary), RatingError> {
        debug!("User {} rating hospital {} with {}", user.id, request.hospital_id, request.score);

        request.validate()?;
        self.hospitals.get_hospital(request.hospital_id, Some(auth_token)).await?;

        let review = request
            .review
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/ratings?on_conflict=user_id,hospital_id",
            Some(auth_token),
            Some(json!({
                "user_id": user.id,
                "hospital_id": request.hospital_id,
                "score": request.score,
                "review": review,
                "created_at": Utc::now().to_rfc3339()
            })),
            Some(merge_duplicates()),
        ).await?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| RatingError::Database("Failed to store rating".to_string()))?;
        let rating: Rating = serde_json::from_value(row)?;

        let summary = summarize(&self.scores_for(request.hospital_id, Some(auth_token)).await?);
        self.hospitals
            .set_rating_summary(request.hospital_id, summary.average, summary.count, auth_token)
            .await?;

        info!("Hospital {} now rated {} over {} reviews", request.hospital_id, summary.average, summary.count);
        Ok((rating, summary))
    }

    async fn scores_for(
        &self,
        hospital_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<u8>, RatingError> {
        let path = format!("/rest/v1/ratings?hospital_id=eq.{}&select=score", hospital_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, auth_token, None).await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get("score").and_then(Value::as_u64))
            .filter_map(|score| u8::try_from(score).ok())
            .collect())
    }

    /// All ratings for a hospital, newest first, with their summary.
    pub async fn hospital_ratings(
        &self,
        hospital_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<(Vec<Rating>, RatingSummary), RatingError> {
        debug!("Fetching ratings for hospital: {}", hospital_id);

        let path = format!("/rest/v1/ratings?hospital_id=eq.{}&order=created_at.desc", hospital_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, auth_token, None).await?;

        let ratings: Vec<Rating> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?;

        let scores: Vec<u8> = ratings.iter().map(|r| r.score).collect();
        Ok((ratings, summarize(&scores)))
    }
}
