use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{CreateSpecialityRequest, HospitalLinkRequest};
use crate::services::SpecialityService;

#[axum::debug_handler]
pub async fn list_specialities(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialityService::new(&state);

    let specialities = service.list_specialities(None).await?;

    Ok(Json(json!({
        "specialities": specialities,
        "total": specialities.len()
    })))
}

#[axum::debug_handler]
pub async fn get_speciality(
    State(state): State<Arc<AppConfig>>,
    Path(speciality_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialityService::new(&state);

    let detail = service.get_speciality_detail(speciality_id, None).await?;

    Ok(Json(json!(detail)))
}

#[axum::debug_handler]
pub async fn create_speciality(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateSpecialityRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "create specialities")?;

    let service = SpecialityService::new(&state);
    let detail = service.create_speciality(request, auth.token()).await?;

    Ok(Json(json!(detail)))
}

#[axum::debug_handler]
pub async fn link_hospital(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(speciality_id): Path<Uuid>,
    Json(request): Json<HospitalLinkRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "link hospitals to specialities")?;

    let service = SpecialityService::new(&state);
    let detail = service.link_hospital(speciality_id, request, auth.token()).await?;

    Ok(Json(json!(detail)))
}
