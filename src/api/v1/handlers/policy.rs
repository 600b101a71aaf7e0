/*
 * Responsibility
 * - GET /cors/policy: report which profile / environment / contract this process enforces
 * - Read-only; the policy is fixed at startup
 */
use axum::{Json, extract::State};

use crate::api::v1::dto::policy::PolicyResponse;
use crate::state::AppState;

pub async fn describe_policy(State(state): State<AppState>) -> Json<PolicyResponse> {
    Json(PolicyResponse::from_policy(&state.policy))
}
