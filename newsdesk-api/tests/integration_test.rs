/// Integration tests for the Newsdesk API
///
/// These tests drive the full router in-process:
/// - Registration and login over HTTP
/// - Bearer token authentication and route protection
/// - Preferences read/write scoped to the caller
/// - News search proxy behaviour
/// - Uniform error responses

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use common::{StubNews, TestContext, STUB_ARTICLES};
use newsdesk_shared::auth::jwt::TokenIssuer;
use serde_json::json;

#[tokio::test]
async fn test_register_then_login_returns_token() {
    let ctx = TestContext::new();

    let registered = ctx.register("alice", "s3cret").await;
    assert_eq!(registered.status, StatusCode::OK);
    assert_eq!(registered.body, "Registered");

    let logged_in = ctx.login("alice", "s3cret").await;
    assert_eq!(logged_in.status, StatusCode::OK);

    let token = logged_in.json()["token"].as_str().unwrap().to_string();
    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn test_stored_password_is_hashed() {
    use newsdesk_shared::models::user::CredentialStore;

    let ctx = TestContext::new();
    ctx.register("alice", "s3cret").await;

    let user = ctx.store.find_by_username("alice").await.unwrap();
    assert_ne!(user.password_hash, "s3cret");
    assert!(user.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let ctx = TestContext::new();

    assert_eq!(ctx.register("alice", "first").await.status, StatusCode::OK);

    let second = ctx.register("alice", "second").await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert_eq!(second.json()["error"], "conflict");

    // The original password still works
    assert_eq!(ctx.login("alice", "first").await.status, StatusCode::OK);
    assert_eq!(
        ctx.login("alice", "second").await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_concurrent_registration_single_winner() {
    let ctx = TestContext::new();

    let (a, b) = tokio::join!(ctx.register("bob", "one"), ctx.register("bob", "two"));

    let mut statuses = vec![a.status.as_u16(), b.status.as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![200, 400]);
    assert_eq!(ctx.store.len().await, 1);
}

#[tokio::test]
async fn test_blank_fields_are_validation_errors() {
    let ctx = TestContext::new();

    let blank_password = ctx.register("alice", "").await;
    assert_eq!(blank_password.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(blank_password.json()["error"], "validation_error");
    assert_eq!(blank_password.json()["details"][0]["field"], "password");

    let whitespace_username = ctx.register("   ", "pw").await;
    assert_eq!(whitespace_username.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(whitespace_username.json()["details"][0]["field"], "username");

    let missing_fields = ctx
        .send_json("POST", "/api/register", None, json!({}))
        .await;
    assert_eq!(missing_fields.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(missing_fields.json()["details"].as_array().unwrap().len(), 2);

    assert!(ctx.store.is_empty().await);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = TestContext::new();
    ctx.register("alice", "s3cret").await;

    let wrong_password = ctx.login("alice", "wrong").await;
    let unknown_user = ctx.login("mallory", "s3cret").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
}

#[tokio::test]
async fn test_preferences_require_authentication() {
    let ctx = TestContext::new();

    let response = ctx.get("/api/preferences", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["error"], "unauthorized");
    assert_eq!(
        response.headers.get("www-authenticate").unwrap(),
        "Bearer"
    );

    let put = ctx
        .send_json("PUT", "/api/preferences", None, json!({ "preferences": "tech" }))
        .await;
    assert_eq!(put.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_preferences_round_trip() {
    let ctx = TestContext::new();
    let token = ctx.register_and_login("alice", "s3cret").await;

    let initial = ctx.get("/api/preferences", Some(&token)).await;
    assert_eq!(initial.status, StatusCode::OK);
    assert_eq!(initial.body, "");

    let updated = ctx
        .send_json(
            "PUT",
            "/api/preferences",
            Some(&token),
            json!({ "preferences": "tech" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body, "Preferences updated");

    let fetched = ctx.get("/api/preferences", Some(&token)).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, "tech");
}

#[tokio::test]
async fn test_preferences_are_per_user() {
    let ctx = TestContext::new();
    let alice = ctx.register_and_login("alice", "a").await;
    let bob = ctx.register_and_login("bob", "b").await;

    ctx.send_json(
        "PUT",
        "/api/preferences",
        Some(&alice),
        json!({ "preferences": "sports" }),
    )
    .await;

    assert_eq!(ctx.get("/api/preferences", Some(&alice)).await.body, "sports");
    assert_eq!(ctx.get("/api/preferences", Some(&bob)).await.body, "");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let ctx = TestContext::new();
    ctx.register("alice", "s3cret").await;

    let issued = Utc::now() - Duration::hours(25);
    let token = ctx.issuer().issue_at("alice", issued).unwrap();

    let response = ctx.get("/api/preferences", Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forged_and_malformed_tokens_rejected() {
    let ctx = TestContext::new();
    ctx.register("alice", "s3cret").await;

    let forged = TokenIssuer::new("some-other-secret-that-is-long-enough!!")
        .unwrap()
        .issue("alice")
        .unwrap();

    let missing_scheme = ctx
        .send(
            Request::builder()
                .uri("/api/preferences")
                .header("authorization", "alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    let forged_response = ctx.get("/api/preferences", Some(&forged)).await;
    let garbage_response = ctx.get("/api/preferences", Some("not.a.token")).await;

    // Every failure looks the same to the caller
    assert_eq!(forged_response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage_response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing_scheme.status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged_response.body, garbage_response.body);
    assert_eq!(forged_response.body, missing_scheme.body);
}

#[tokio::test]
async fn test_bad_token_on_public_route_is_ignored() {
    let ctx = TestContext::new();

    let response = ctx
        .send_json(
            "POST",
            "/api/register",
            Some("garbage"),
            json!({ "username": "alice", "password": "s3cret" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new();

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["store_status"], "connected");
}

#[tokio::test]
async fn test_news_search() {
    let ctx = TestContext::new();
    let token = ctx.register_and_login("alice", "s3cret").await;

    let unauthenticated = ctx.get("/api/news?q=rust", None).await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);

    let response = ctx.get("/api/news?q=rust", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, STUB_ARTICLES);
    assert_eq!(
        response.headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_news_search_requires_query() {
    let ctx = TestContext::new();
    let token = ctx.register_and_login("alice", "s3cret").await;

    let missing = ctx.get("/api/news", Some(&token)).await;
    assert_eq!(missing.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(missing.json()["details"][0]["field"], "q");

    let blank = ctx.get("/api/news?q=%20%20", Some(&token)).await;
    assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_news_upstream_failure_is_unavailable() {
    let ctx = TestContext::with_news(StubNews::Down);
    let token = ctx.register_and_login("alice", "s3cret").await;

    let response = ctx.get("/api/news?q=rust", Some(&token)).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    // Upstream details stay in the logs
    assert!(!response.body.contains("connection refused"));
}
