//! CORS behavior over a real listener.

use reqwest::{Method, StatusCode};

mod common;

async fn preflight(server: &common::TestServer, path: &str, origin: &str, method: &str) -> reqwest::Response {
    common::client()
        .request(Method::OPTIONS, server.url(path))
        .header("origin", origin)
        .header("access-control-request-method", method)
        .send()
        .await
        .expect("server unreachable")
}

fn header<'a>(res: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    res.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_preflight_reports_fixed_rule_on_any_path() {
    let server = common::start_server("https://a.com, https://b.com").await;

    for path in ["/", "/health", "/api/game/v2", "/not/a/route"] {
        let res = preflight(&server, path, "https://b.com", "PUT").await;

        assert_eq!(res.status(), StatusCode::OK, "path {path}");
        assert_eq!(header(&res, "access-control-allow-origin"), Some("https://b.com"));
        assert_eq!(
            header(&res, "access-control-allow-methods"),
            Some("GET, POST, PUT, DELETE, OPTIONS")
        );
        assert_eq!(header(&res, "access-control-allow-headers"), Some("*"));
        assert_eq!(header(&res, "access-control-allow-credentials"), Some("true"));
        assert_eq!(header(&res, "access-control-max-age"), Some("3600"));
    }
}

#[tokio::test]
async fn test_preflight_rejections() {
    let server = common::start_server("https://a.com").await;

    let res = preflight(&server, "/api/game/v2", "https://evil.com", "GET").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(header(&res, "access-control-allow-origin"), None);

    let res = preflight(&server, "/api/game/v2", "https://a.com", "PATCH").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_wildcard_and_port_patterns() {
    let server = common::start_server("https://*.example.com, http://localhost:[*]").await;

    let res = preflight(&server, "/", "https://api.example.com", "GET").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = preflight(&server, "/", "http://localhost:5173", "POST").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header(&res, "access-control-allow-origin"), Some("http://localhost:5173"));

    let res = preflight(&server, "/", "https://example.org", "GET").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_default_configuration_allows_no_real_origin() {
    let server = common::start_server("default").await;

    let res = preflight(&server, "/", "https://a.com", "GET").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Same-origin and non-browser requests are unaffected.
    let res = common::client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_actual_request_gets_cors_headers() {
    let server = common::start_server("https://a.com").await;

    let res = common::client()
        .get(server.url("/api/game/v2"))
        .header("origin", "https://a.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(header(&res, "access-control-allow-origin"), Some("https://a.com"));
    assert_eq!(header(&res, "access-control-allow-credentials"), Some("true"));
    assert!(header(&res, "x-request-id").is_some());
}

#[tokio::test]
async fn test_multi_port_list_pattern() {
    let server = common::start_server("http://localhost:[3000,5173], https://a.com").await;

    for origin in ["http://localhost:3000", "http://localhost:5173", "https://a.com"] {
        let res = preflight(&server, "/api/game/v2", origin, "GET").await;
        assert_eq!(res.status(), StatusCode::OK, "origin {origin}");
    }

    let res = preflight(&server, "/api/game/v2", "http://localhost:8080", "GET").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
