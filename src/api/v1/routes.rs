/*
 * Responsibility
 * - v1 URL layout
 * - /health for liveness, /cors/policy to inspect the active CORS contract
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::{health::health, policy::describe_policy};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/cors/policy", get(describe_policy))
}
