/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - In-memory credential store (no database required)
/// - Fast password hashing parameters
/// - Stub news search backend
/// - Request helpers driving the router in-process

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use newsdesk_api::app::{build_router, AppState};
use newsdesk_api::config::{ApiConfig, Config, JwtConfig, NewsConfig};
use newsdesk_shared::auth::jwt::TokenIssuer;
use newsdesk_shared::auth::password::PasswordHasher;
use newsdesk_shared::models::user::InMemoryCredentialStore;
use newsdesk_shared::news::{NewsError, NewsSearch};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::Service as _;

/// Signing secret shared by the app and tests that mint their own tokens
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Canned upstream body returned by [`StubNews`]
pub const STUB_ARTICLES: &str = r#"{"status":"ok","totalResults":1,"articles":[{"title":"Rust 2.0"}]}"#;

/// News backend that answers from memory
pub enum StubNews {
    /// Echoes a fixed body
    Ok,
    /// Fails as if the upstream were down
    Down,
}

#[async_trait]
impl NewsSearch for StubNews {
    async fn search(&self, _query: &str, cancel: &CancellationToken) -> Result<String, NewsError> {
        if cancel.is_cancelled() {
            return Err(NewsError::Cancelled);
        }
        match self {
            StubNews::Ok => Ok(STUB_ARTICLES.to_string()),
            StubNews::Down => Err(NewsError::Upstream("connection refused".to_string())),
        }
    }
}

/// Response status and body
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Parses the body as JSON
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| {
            panic!("expected JSON body, got {:?}: {}", self.body, e)
        })
    }
}

/// Test context containing the router and its collaborators
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<InMemoryCredentialStore>,
}

impl TestContext {
    /// Creates a context with a working news stub
    pub fn new() -> Self {
        Self::with_news(StubNews::Ok)
    }

    /// Creates a context with the given news stub
    pub fn with_news(news: StubNews) -> Self {
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: None,
            jwt: JwtConfig {
                secret: TEST_SECRET.to_string(),
            },
            news: NewsConfig {
                api_url: "http://127.0.0.1:9/unused".to_string(),
                api_key: None,
                timeout_secs: 1,
            },
        };

        let store = Arc::new(InMemoryCredentialStore::new());
        let hasher = PasswordHasher::with_params(4096, 1, 1).expect("valid test params");
        let state = AppState::new(config, store.clone(), hasher, Arc::new(news))
            .expect("valid test secret");

        Self {
            app: build_router(state),
            store,
        }
    }

    /// Issuer for minting tokens outside the login flow
    pub fn issuer(&self) -> TokenIssuer {
        TokenIssuer::new(TEST_SECRET).expect("valid test secret")
    }

    /// Sends a request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }

    /// Sends a JSON request with an optional bearer token
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Sends a bodiless GET with an optional bearer token
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// POST /api/register
    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        self.send_json(
            "POST",
            "/api/register",
            None,
            json!({ "username": username, "password": password }),
        )
        .await
    }

    /// POST /api/login
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.send_json(
            "POST",
            "/api/login",
            None,
            json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Registers a user and returns a fresh token for them
    pub async fn register_and_login(&self, username: &str, password: &str) -> String {
        let registered = self.register(username, password).await;
        assert_eq!(registered.status, StatusCode::OK, "{}", registered.body);

        let logged_in = self.login(username, password).await;
        assert_eq!(logged_in.status, StatusCode::OK, "{}", logged_in.body);

        logged_in.json()["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }
}
