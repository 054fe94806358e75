//! CORS enforcement middleware.
//!
//! # Responsibilities
//! - Answer preflight requests from the registered [`CorsPolicy`]
//! - Decorate allowed cross-origin responses
//! - Refuse disallowed origins and methods with 403
//!
//! # Design Decisions
//! - Requests without `Origin`, or from the request's own scheme and host, pass through
//! - Preflights are answered here and never reach a handler
//! - A cross-origin `OPTIONS` without `Access-Control-Request-Method` is
//!   answered with `Allow` plus the actual-request headers
//! - The concrete origin is echoed since credentials are allowed

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, ALLOW, HOST, ORIGIN,
            VARY,
        },
        HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::request_id_of;
use crate::observability::metrics;
use crate::policy::CorsPolicy;

const VARY_PREFLIGHT: [&str; 3] = [
    "Origin",
    "Access-Control-Request-Method",
    "Access-Control-Request-Headers",
];

pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(origin) = request.headers().get(ORIGIN).cloned() else {
        return next.run(request).await;
    };

    if !policy.applies_to(request.uri().path()) || is_same_origin(&request, &origin) {
        return next.run(request).await;
    }

    let request_id = request_id_of(&request).to_string();
    let origin_allowed = origin
        .to_str()
        .map(|o| policy.allows_origin(o))
        .unwrap_or(false);

    if !origin_allowed {
        tracing::warn!(request_id = %request_id, origin = ?origin, "CORS origin rejected");
        return reject("origin");
    }

    if is_preflight(&request) {
        return preflight_response(&policy, &request, origin, &request_id);
    }

    if !policy.allows_method(request.method()) {
        tracing::warn!(
            request_id = %request_id,
            method = %request.method(),
            "CORS method rejected"
        );
        return reject("method");
    }

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        insert_text(response.headers_mut(), ALLOW, &policy.allow_methods_value());
        decorate(&policy, response.headers_mut(), origin);
        return response;
    }

    let mut response = next.run(request).await;
    decorate(&policy, response.headers_mut(), origin);
    response
}

fn decorate(policy: &CorsPolicy, headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    if policy.allow_credentials() {
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    }
    headers.append(VARY, HeaderValue::from_static("Origin"));
}

fn is_preflight(request: &Request<Body>) -> bool {
    request.method() == Method::OPTIONS
        && request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD)
}

/// `Origin` names the scheme and host the request was sent to.
///
/// The listener speaks plain HTTP, so a request URI without a scheme is `http`.
fn is_same_origin(request: &Request<Body>, origin: &HeaderValue) -> bool {
    let (Some(host), Ok(origin)) = (
        request.headers().get(HOST).and_then(|h| h.to_str().ok()),
        origin.to_str(),
    ) else {
        return false;
    };
    let scheme = request.uri().scheme_str().unwrap_or("http");

    origin
        .split_once("://")
        .map(|(origin_scheme, authority)| {
            origin_scheme.eq_ignore_ascii_case(scheme)
                && authority.trim_end_matches('/').eq_ignore_ascii_case(host)
        })
        .unwrap_or(false)
}

fn preflight_response(
    policy: &CorsPolicy,
    request: &Request<Body>,
    origin: HeaderValue,
    request_id: &str,
) -> Response {
    let requested_method = request
        .headers()
        .get(ACCESS_CONTROL_REQUEST_METHOD)
        .and_then(|v| v.to_str().ok())
        .and_then(|m| m.trim().parse::<Method>().ok());

    let Some(requested_method) = requested_method.filter(|m| policy.allows_method(m)) else {
        tracing::warn!(request_id = %request_id, "CORS preflight method rejected");
        return reject("method");
    };

    let requested_headers = request
        .headers()
        .get(ACCESS_CONTROL_REQUEST_HEADERS)
        .and_then(|v| v.to_str().ok());

    if let Some(list) = requested_headers {
        if !policy.allows_headers(list) {
            tracing::warn!(request_id = %request_id, headers = %list, "CORS preflight headers rejected");
            return reject("headers");
        }
    }

    tracing::debug!(
        request_id = %request_id,
        origin = ?origin,
        method = %requested_method,
        "CORS preflight accepted"
    );
    metrics::record_preflight();

    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    insert_text(headers, ACCESS_CONTROL_ALLOW_METHODS, &policy.allow_methods_value());
    insert_text(
        headers,
        ACCESS_CONTROL_ALLOW_HEADERS,
        &policy.allow_headers_value(requested_headers),
    );
    if policy.allow_credentials() {
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
    }
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(policy.max_age().as_secs()));
    append_vary(headers);
    response
}

fn reject(reason: &'static str) -> Response {
    metrics::record_cors_rejected(reason);
    let mut response = (StatusCode::FORBIDDEN, "Invalid CORS request").into_response();
    append_vary(response.headers_mut());
    response
}

fn append_vary(headers: &mut HeaderMap) {
    for name in VARY_PREFLIGHT {
        headers.append(VARY, HeaderValue::from_static(name));
    }
}

fn insert_text(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorsConfig;
    use crate::policy::build_cors_policy;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(patterns: &str) -> Router {
        let policy = Arc::new(build_cors_policy(&CorsConfig {
            origin_patterns: patterns.into(),
        }));
        Router::new()
            .route("/items", get(|| async { "items" }).post(|| async { "created" }))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .layer(middleware::from_fn_with_state(policy, cors_middleware))
    }

    fn preflight(path: &str, origin: &str, method: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri(path)
            .header(ORIGIN, origin)
            .header(ACCESS_CONTROL_REQUEST_METHOD, method)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_preflight_allowed() {
        let response = app("https://a.com")
            .oneshot(preflight("/items", "https://a.com", "POST"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let h = response.headers();
        assert_eq!(h[ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.com");
        assert_eq!(h[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, PUT, DELETE, OPTIONS");
        assert_eq!(h[ACCESS_CONTROL_ALLOW_HEADERS], "*");
        assert_eq!(h[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(h[ACCESS_CONTROL_MAX_AGE], "3600");
        assert_eq!(h.get_all(VARY).iter().count(), 3);
    }

    #[tokio::test]
    async fn test_preflight_on_unrouted_path() {
        let response = app("https://a.com")
            .oneshot(preflight("/nowhere/at/all", "https://a.com", "DELETE"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_MAX_AGE], "3600");
    }

    #[tokio::test]
    async fn test_preflight_echoes_requested_headers() {
        let mut request = preflight("/items", "https://a.com", "PUT");
        request.headers_mut().insert(
            ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_static("content-type, x-trace"),
        );
        let response = app("https://a.com").oneshot(request).await.unwrap();
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_HEADERS],
            "content-type, x-trace"
        );
    }

    #[tokio::test]
    async fn test_preflight_rejects_origin() {
        let response = app("https://a.com")
            .oneshot(preflight("/items", "https://evil.com", "GET"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_preflight_rejects_method() {
        let response = app("https://a.com")
            .oneshot(preflight("/items", "https://a.com", "PATCH"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_actual_request_decorated() {
        let request = Request::builder()
            .uri("/items")
            .header(ORIGIN, "https://api.b.com")
            .body(Body::empty())
            .unwrap();
        let response = app("https://a.com, https://*.b.com")
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://api.b.com");
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert!(response.headers().get(ACCESS_CONTROL_MAX_AGE).is_none());
    }

    #[tokio::test]
    async fn test_actual_request_with_disallowed_method() {
        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/items")
            .header(ORIGIN, "https://a.com")
            .body(Body::empty())
            .unwrap();
        let response = app("https://a.com").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_no_origin_passes_through() {
        let request = Request::builder().uri("/items").body(Body::empty()).unwrap();
        let response = app("").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_same_origin_passes_through() {
        let request = Request::builder()
            .uri("/items")
            .header(HOST, "localhost:8080")
            .header(ORIGIN, "http://localhost:8080")
            .body(Body::empty())
            .unwrap();
        let response = app("default").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_same_host_other_scheme_is_cross_origin() {
        let request = Request::builder()
            .uri("/items")
            .header(HOST, "localhost:8080")
            .header(ORIGIN, "https://localhost:8080")
            .body(Body::empty())
            .unwrap();
        let response = app("default").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_plain_options_from_allowed_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/items")
            .header(ORIGIN, "https://a.com")
            .body(Body::empty())
            .unwrap();
        let response = app("https://a.com").oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let h = response.headers();
        assert_eq!(h[ALLOW], "GET, POST, PUT, DELETE, OPTIONS");
        assert_eq!(h[ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.com");
        assert_eq!(h[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert!(h.get(ACCESS_CONTROL_MAX_AGE).is_none());
    }

    #[tokio::test]
    async fn test_empty_config_rejects_cross_origin() {
        let request = Request::builder()
            .uri("/items")
            .header(ORIGIN, "https://a.com")
            .body(Body::empty())
            .unwrap();
        let response = app("").oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
