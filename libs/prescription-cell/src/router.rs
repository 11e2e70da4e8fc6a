use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn prescription_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/create", post(handlers::create_prescription))
        .route("/doctor", get(handlers::get_doctor_prescriptions))
        .route("/patient", get(handlers::get_patient_prescriptions))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Share-by-link lookup stays public on purpose.
    let public_routes = Router::new()
        .route("/{prescription_id}", get(handlers::get_prescription));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .with_state(state)
}
