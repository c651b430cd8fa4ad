use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;
use shared_utils::pagination::Pagination;

use crate::models::CreateFeedbackRequest;
use crate::services::FeedbackService;

#[axum::debug_handler]
pub async fn submit_feedback(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = FeedbackService::new(&state);

    let (feedback, notified) = service.submit(request).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "feedback": feedback,
        "notified": notified
    }))))
}

#[axum::debug_handler]
pub async fn list_feedback(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(page): Query<Pagination>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "read contact messages")?;

    let service = FeedbackService::new(&state);
    let messages = service.list(&page, auth.token()).await?;

    Ok(Json(json!({
        "feedback": messages,
        "total": messages.len()
    })))
}
