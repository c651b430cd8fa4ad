use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;
use shared_utils::pagination::Pagination;

use crate::models::{CreateHospitalRequest, HospitalSearchFilters, NearbyQuery};
use crate::services::HospitalService;

#[derive(Debug, Deserialize)]
pub struct HospitalSearchQuery {
    pub name: Option<String>,
    pub city: Option<String>,
    pub speciality_id: Option<Uuid>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn search_hospitals(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<HospitalSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = HospitalService::new(&state);

    let filters = HospitalSearchFilters {
        name: query.name,
        city: query.city,
        speciality_id: query.speciality_id,
    };
    let page = Pagination { limit: query.limit, offset: query.offset };

    let hospitals = service.search_hospitals(filters, &page, None).await?;

    Ok(Json(json!({
        "hospitals": hospitals,
        "total": hospitals.len()
    })))
}

#[axum::debug_handler]
pub async fn nearby_hospitals(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Value>, AppError> {
    let service = HospitalService::new(&state);

    let hospitals = service.find_nearby(query, None).await?;

    Ok(Json(json!({
        "hospitals": hospitals,
        "total": hospitals.len()
    })))
}

#[axum::debug_handler]
pub async fn get_hospital(
    State(state): State<Arc<AppConfig>>,
    Path(hospital_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = HospitalService::new(&state);

    let hospital = service.get_hospital(hospital_id, None).await?;

    Ok(Json(json!(hospital)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_hospital(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "create hospitals")?;

    let service = HospitalService::new(&state);
    let hospital = service
        .create_hospital(request, state.default_daily_capacity, auth.token())
        .await?;

    Ok(Json(json!(hospital)))
}
