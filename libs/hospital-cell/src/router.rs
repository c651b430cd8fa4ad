use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn hospital_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/search", get(handlers::search_hospitals))
        .route("/nearby", get(handlers::nearby_hospitals))
        .route("/{hospital_id}", get(handlers::get_hospital));

    let protected_routes = Router::new()
        .route("/", post(handlers::create_hospital))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
