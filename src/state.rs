/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 * - Cheap to Clone (everything behind Arc)
 */
use std::sync::Arc;

use crate::services::cors::OriginPolicy;

#[derive(Clone, Debug)]
pub struct AppState {
    pub policy: Arc<OriginPolicy>,
}

impl AppState {
    pub fn new(policy: Arc<OriginPolicy>) -> Self {
        Self { policy }
    }
}
