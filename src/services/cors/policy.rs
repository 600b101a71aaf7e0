use crate::config::AppEnv;

use super::types::{AdmissionDecision, AdmissionReason, CorsProfile, PolicyConfig};

// Substrings that mark a local dev origin. Plain substring search over the whole origin.
const DEV_LOCAL_MARKERS: [&str; 2] = ["localhost", "127.0.0.1"];

/// Decide whether a cross-origin request is admitted.
///
/// Rules, first match wins:
/// 1. no (or empty) origin: admitted, the client is not a browser doing CORS
/// 2. development and the origin contains `localhost` / `127.0.0.1`: admitted
/// 3. the origin is in the allow-list: admitted
/// 4. otherwise denied
///
/// Never fails. Malformed origins fall through to a denial.
pub fn evaluate(origin: Option<&str>, config: &PolicyConfig, env: AppEnv) -> AdmissionDecision {
    let origin = match origin {
        Some(origin) if !origin.is_empty() => origin,
        _ => return AdmissionDecision::from_reason(AdmissionReason::NoOriginHeader),
    };

    let reason = if env.is_development() && is_dev_local(origin) {
        AdmissionReason::DevelopmentLocalMatch
    } else if config.allowed_origins.matches(origin) {
        AdmissionReason::AllowListMatch
    } else {
        AdmissionReason::Denied
    };

    AdmissionDecision::from_reason(reason)
}

fn is_dev_local(origin: &str) -> bool {
    DEV_LOCAL_MARKERS.iter().any(|marker| origin.contains(marker))
}

/// The policy a process runs with: config and environment fixed at startup.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    profile: CorsProfile,
    config: PolicyConfig,
    env: AppEnv,
}

impl OriginPolicy {
    pub fn new(profile: CorsProfile, config: PolicyConfig, env: AppEnv) -> Self {
        Self {
            profile,
            config,
            env,
        }
    }

    pub fn evaluate(&self, origin: Option<&str>) -> AdmissionDecision {
        evaluate(origin, &self.config, self.env)
    }

    pub fn profile(&self) -> CorsProfile {
        self.profile
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn env(&self) -> AppEnv {
        self.env
    }
}
