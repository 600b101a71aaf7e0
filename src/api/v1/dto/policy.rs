use serde::Serialize;

use crate::config::AppEnv;
use crate::services::cors::{CorsProfile, OriginPolicy, PolicyConfig};

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub profile: CorsProfile,
    pub environment: AppEnv,
    // Whether localhost / 127.0.0.1 origins bypass the allow-list
    pub development_local_origins: bool,
    pub config: PolicyConfig,
}

impl PolicyResponse {
    pub fn from_policy(policy: &OriginPolicy) -> Self {
        Self {
            profile: policy.profile(),
            environment: policy.env(),
            development_local_origins: policy.env().is_development(),
            config: policy.config().clone(),
        }
    }
}
