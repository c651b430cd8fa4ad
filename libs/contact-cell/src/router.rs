use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn contact_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", post(handlers::submit_feedback));

    let protected_routes = Router::new()
        .route("/", get(handlers::list_feedback))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
