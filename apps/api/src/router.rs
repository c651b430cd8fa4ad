use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use contact_cell::router::contact_routes;
use hospital_cell::router::hospital_routes;
use rating_cell::router::rating_routes;
use shared_config::AppConfig;
use speciality_cell::router::speciality_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "CareConnect API is running!" }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/hospitals", hospital_routes(state.clone()))
        .nest("/speciality", speciality_routes(state.clone()))
        .nest("/ratings", rating_routes(state.clone()))
        .nest("/contact", contact_routes(state))
}
