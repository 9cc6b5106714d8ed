//! Integration tests for error shapes and rate limiting.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, get, post_json, send, test_config, TestApp};
use passgate_api::config::RateLimitConfig;
use serde_json::json;

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::new();
    let request = Request::post("/api/v1/login")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = send(app.app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "invalid request" }));
}

#[tokio::test]
async fn missing_content_type_is_bad_request() {
    let app = TestApp::new();
    let request = Request::post("/api/v1/login")
        .body(Body::from(
            json!({ "email": "a@b.co", "password": "x" }).to_string(),
        ))
        .unwrap();

    let response = send(app.app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validation_failure_names_the_problem() {
    let app = TestApp::new();
    let response = post_json(
        app.app(),
        "/api/v1/forgot-password",
        json!({ "email": "nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid email address");
}

fn tight_limits(trust_forwarded: bool) -> TestApp {
    let mut config = test_config();
    config.rate_limit = RateLimitConfig {
        per_second: 1,
        burst: 2,
        trust_forwarded,
    };
    TestApp::with(config, None)
}

fn from_ip(uri: &str, ip: &str) -> Request<Body> {
    Request::get(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn rate_limit_returns_429_per_client_ip() {
    let app = tight_limits(true);
    let uri = "/api/v1/verify-magic-link?token=x";

    for _ in 0..2 {
        let response = send(app.app(), from_ip(uri, "198.51.100.1")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    let limited = send(app.app(), from_ip(uri, "198.51.100.1")).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(limited).await, json!({ "error": "too many requests" }));

    // A different client is unaffected.
    let other = send(app.app(), from_ip(uri, "198.51.100.2")).await;
    assert_eq!(other.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_is_not_rate_limited() {
    let app = tight_limits(true);
    for _ in 0..5 {
        let response = get(app.app(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_bucket_when_untrusted() {
    let app = tight_limits(false);
    let uri = "/api/v1/verify-magic-link?token=x";

    for ip in ["198.51.100.1", "198.51.100.2"] {
        let response = send(app.app(), from_ip(uri, ip)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    let limited = send(app.app(), from_ip(uri, "198.51.100.3")).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
}
