use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::bearer_token;
use shared_utils::jwt;

#[axum::debug_handler]
pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_token(&headers)?;

    let user = jwt::validate_token(token, &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

#[axum::debug_handler]
pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = bearer_token(&headers)?;
    let valid = jwt::validate_token(token, &config.supabase_jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

/// Claims user plus the matching `users` row, if one exists.
#[axum::debug_handler]
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", user.id);

    let token = bearer_token(&headers)?;
    let client = SupabaseClient::new(&config);

    let path = format!("/rest/v1/users?id=eq.{}", user.id);
    let rows: Vec<Value> = client
        .request(Method::GET, &path, Some(token), None)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    let profile = rows.into_iter().next();
    if profile.is_none() {
        warn!("No users row for {}", user.id);
    }

    Ok(Json(json!({
        "user": user,
        "profile": profile
    })))
}
