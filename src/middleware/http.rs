//! Transport layers wrapped around the whole Router, CORS included.
//!
//! `app::build_router` applies this after `cors::apply`, which makes these the outer
//! layers. A request the CORS policy rejects has therefore already been given an
//! `x-request-id`, is covered by the access log span, and is bounded by the same
//! timeout as any other request. The 403 it ends with carries the id back to the
//! client like every other response.
//!
//! Body limit and timeout come from `Config` (`HTTP_BODY_LIMIT_BYTES`,
//! `HTTP_TIMEOUT_SECONDS`).

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header::HeaderName};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn apply(router: Router, config: &Config) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        // Turn timeout errors into responses so the service stays `Infallible`.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(TimeoutLayer::new(config.timeout))
        .layer(TraceLayer::new_for_http());

    router.layer(layers)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::body::Body;
    use axum::http::{Method, Request};
    use axum::routing::post;
    use tower::ServiceExt;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    fn echo_router(config: &Config) -> Router {
        apply(Router::new().route("/echo", post(|body: String| async move { body })), config)
    }

    fn post_body(body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/echo")
            .header("content-length", body.len())
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn body_over_configured_limit_is_rejected() {
        let router = echo_router(&config(&[("HTTP_BODY_LIMIT_BYTES", "4")]));

        let res = router.oneshot(post_body("longer than four")).await.unwrap();

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn request_id_is_generated_and_returned() {
        let router = echo_router(&config(&[]));

        let res = router.oneshot(post_body("ok")).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().get(REQUEST_ID_HEADER).is_some());
    }

    #[tokio::test]
    async fn incoming_request_id_is_propagated() {
        let router = echo_router(&config(&[]));
        let mut req = post_body("ok");
        req.headers_mut()
            .insert(REQUEST_ID_HEADER, "abc-123".parse().unwrap());

        let res = router.oneshot(req).await.unwrap();

        assert_eq!(res.headers().get(REQUEST_ID_HEADER).unwrap(), "abc-123");
    }
}
