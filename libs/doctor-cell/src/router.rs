use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    // The directory is public so patients can browse before logging in.
    let public_routes = Router::new()
        .route("/all", get(handlers::get_all_doctors));

    let protected_routes = Router::new()
        .route("/my-patients", get(handlers::get_my_patients))
        .route("/patient-history/{patient_id}", get(handlers::get_patient_history))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
