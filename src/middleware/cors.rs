//! CORS enforcement for browser clients.
//!
//! Note:
//! - CORS is enforced by browsers. Native mobile apps and server-to-server calls send no
//!   `Origin` header and pass through untouched.
//! - This middleware should be applied at the Router level (not inside handlers).
//!
//! Responsibility:
//! - Ask the `OriginPolicy` for a verdict once per request.
//! - Denied: fail the request with `AppError::OriginRejected` (403). The handler never runs.
//! - Admitted: echo the received origin (never `*`) plus the rest of the CORS contract.
//! - Preflight (`OPTIONS`): answer directly with the configured success status unless
//!   `preflight_continue` is set.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderValue, InvalidHeaderValue};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::services::cors::{AdmissionReason, OriginPolicy, PolicyConfig};

/// Apply the CORS policy to the given Router.
///
/// Header values are rendered once here, so a config that cannot be expressed as
/// HTTP headers fails at startup instead of per request.
pub fn apply(router: Router, policy: Arc<OriginPolicy>) -> Result<Router, InvalidHeaderValue> {
    let headers = Arc::new(CorsHeaders::from_config(policy.config())?);
    let state = CorsState { policy, headers };

    Ok(router.layer(middleware::from_fn_with_state(state, enforce)))
}

#[derive(Clone)]
struct CorsState {
    policy: Arc<OriginPolicy>,
    headers: Arc<CorsHeaders>,
}

/// Pre-rendered response headers for admitted requests.
struct CorsHeaders {
    allow_credentials: Option<HeaderValue>,
    allow_methods: Option<HeaderValue>,
    allow_headers: Option<HeaderValue>,
    expose_headers: Option<HeaderValue>,
    max_age: HeaderValue,
}

impl CorsHeaders {
    fn from_config(config: &PolicyConfig) -> Result<Self, InvalidHeaderValue> {
        let methods = config
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            allow_credentials: config
                .allow_credentials
                .then(|| HeaderValue::from_static("true")),
            allow_methods: non_empty(&methods)?,
            allow_headers: non_empty(&config.allowed_headers.header_value())?,
            expose_headers: non_empty(&config.exposed_headers.join(", "))?,
            max_age: HeaderValue::from(config.max_age_seconds),
        })
    }

    fn write(&self, origin: HeaderValue, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);

        if let Some(v) = &self.allow_credentials {
            headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, v.clone());
        }
        if let Some(v) = &self.allow_methods {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, v.clone());
        }
        if let Some(v) = &self.allow_headers {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, v.clone());
        }
        if let Some(v) = &self.expose_headers {
            headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, v.clone());
        }
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }
}

fn non_empty(value: &str) -> Result<Option<HeaderValue>, InvalidHeaderValue> {
    if value.is_empty() {
        Ok(None)
    } else {
        HeaderValue::from_str(value).map(Some)
    }
}

async fn enforce(State(state): State<CorsState>, req: Request, next: Next) -> Response {
    let mut res = match admit_or_reject(&state, req, next).await {
        Ok(res) => res,
        Err(err) => err.into_response(),
    };
    // Every response here depends on the request's Origin (headers, 403, or neither),
    // so shared caches must key on it.
    res.headers_mut()
        .append(header::VARY, HeaderValue::from_static("origin"));
    res
}

async fn admit_or_reject(
    state: &CorsState,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let origin = req.headers().get(header::ORIGIN).cloned();
    // Non UTF-8 origins are decoded lossily and still go through the rules.
    let origin_text = origin
        .as_ref()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    let decision = state.policy.evaluate(origin_text.as_deref());

    if !decision.admit {
        let origin = origin_text.unwrap_or_default();
        tracing::warn!(
            %origin,
            method = %req.method(),
            path = %req.uri().path(),
            "cross-origin request rejected"
        );
        return Err(AppError::origin_rejected(origin));
    }

    let origin = match origin {
        Some(origin) if decision.reason != AdmissionReason::NoOriginHeader => origin,
        _ => return Ok(next.run(req).await),
    };

    tracing::debug!(
        origin = origin_text.as_deref().unwrap_or_default(),
        reason = ?decision.reason,
        "cross-origin request admitted"
    );

    let config = state.policy.config();
    if req.method() == Method::OPTIONS && !config.preflight_continue {
        let mut res = config.success_status.into_response();
        state.headers.write(origin, res.headers_mut());
        return Ok(res);
    }

    let mut res = next.run(req).await;
    state.headers.write(origin, res.headers_mut());
    Ok(res)
}
