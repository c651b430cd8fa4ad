use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::CreateRatingRequest;
use crate::services::RatingService;

#[axum::debug_handler]
pub async fn submit_rating(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateRatingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = RatingService::new(&state);

    let (rating, summary) = service.submit_rating(&user, request, auth.token()).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "rating": rating,
        "summary": summary
    }))))
}

#[axum::debug_handler]
pub async fn get_hospital_ratings(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = RatingService::new(&state);

    let (ratings, summary) = service.hospital_ratings(hospital_id, None).await?;

    Ok(Json(json!({
        "ratings": ratings,
        "summary": summary
    })))
}
