/*
 * Responsibility
 * - Load config → build the origin policy → assemble the Router
 * - Apply middleware (CORS inside, HTTP cross-cutting layers outside)
 * - Serve with axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use axum::http::header::InvalidHeaderValue;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::cors::{AllowedOrigins, CorsProfile, OriginPolicy};
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,cors_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Surface panics through tracing; stderr may not be collected.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(config.app_env.is_development());

    tracing::info!(
        env = ?config.app_env,
        profile = ?config.cors_profile,
        addr = %config.addr,
        "starting cors-gate"
    );

    let state = build_state(&config);
    warn_on_unusual_policy(&state.policy);

    let app = build_router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &Config) -> AppState {
    // The environment is captured here once; the policy never reads it again.
    let policy = OriginPolicy::new(config.cors_profile, config.policy_config(), config.app_env);
    AppState::new(Arc::new(policy))
}

fn warn_on_unusual_policy(policy: &OriginPolicy) {
    match (policy.profile(), &policy.config().allowed_origins) {
        (CorsProfile::Permissive, _) => {
            tracing::warn!("permissive CORS profile: every browser origin is admitted");
        }
        (CorsProfile::Strict, AllowedOrigins::List(origins)) if origins.is_empty() => {
            tracing::warn!("CORS allow-list is empty: only origin-less requests are admitted");
        }
        _ => {}
    }
}

fn build_router(state: AppState, config: &Config) -> Result<Router, InvalidHeaderValue> {
    let policy = state.policy.clone();

    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .with_state(state);

    let router = middleware::cors::apply(router, policy)?;
    Ok(middleware::http::apply(router, config))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::http::REQUEST_ID_HEADER;

    fn app(pairs: &[(&str, &str)]) -> Router {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
        build_router(build_state(&config), &config).unwrap()
    }

    fn get(uri: &str, origin: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_without_origin_is_served() {
        let res = app(&[])
            .oneshot(get("/api/v1/health", None))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(REQUEST_ID_HEADER).is_some());
        assert_eq!(json_body(res).await["status"], "ok");
    }

    #[tokio::test]
    async fn rejected_origin_still_gets_a_request_id() {
        let res = app(&[])
            .oneshot(get("/api/v1/health", Some("https://evil.example.com")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(res.headers().get(REQUEST_ID_HEADER).is_some());
        assert_eq!(json_body(res).await["error"]["code"], "ORIGIN_REJECTED");
    }

    #[tokio::test]
    async fn configured_allow_list_is_enforced() {
        let router = app(&[("CORS_ALLOWED_ORIGINS", "https://app.example.com")]);

        let ok = router
            .clone()
            .oneshot(get("/api/v1/health", Some("https://app.example.com")))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(
            ok.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://app.example.com"
        );

        // The default entry is replaced, not extended.
        let replaced = router
            .oneshot(get("/api/v1/health", Some("http://localhost:3000")))
            .await
            .unwrap();
        assert_eq!(replaced.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn development_preflight_from_local_origin_is_no_content() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/health")
            .header(header::ORIGIN, "http://127.0.0.1:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();

        let res = app(&[("APP_ENV", "development")])
            .oneshot(req)
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://127.0.0.1:5173"
        );
    }

    #[tokio::test]
    async fn policy_endpoint_describes_active_profile() {
        let res = app(&[("APP_ENV", "development"), ("CORS_PROFILE", "permissive")])
            .oneshot(get("/api/v1/cors/policy", None))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["profile"], "permissive");
        assert_eq!(body["environment"], "development");
        assert_eq!(body["development_local_origins"], true);
        assert_eq!(body["config"]["allowed_origins"], "*");
        assert_eq!(body["config"]["allow_credentials"], false);
        assert_eq!(body["config"]["max_age_seconds"], 86400);
    }

    #[tokio::test]
    async fn unknown_route_passes_cors_then_404s() {
        let res = app(&[])
            .oneshot(get("/nope", Some("http://localhost:3000")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
