/// Application state and router builder
///
/// This module wires the authentication core into an Axum router. Every collaborator
/// is constructed once at startup and injected through [`AppState`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use newsdesk_api::{app::{build_router, AppState}, config::Config};
/// use newsdesk_shared::auth::password::PasswordHasher;
/// use newsdesk_shared::models::user::InMemoryCredentialStore;
/// use newsdesk_shared::news::{HttpNewsClient, NewsClientConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let news = HttpNewsClient::new(NewsClientConfig {
///     base_url: config.news.api_url.clone(),
///     api_key: config.news.api_key.clone(),
///     timeout: std::time::Duration::from_secs(config.news.timeout_secs),
/// })?;
///
/// let state = AppState::new(
///     config,
///     Arc::new(InMemoryCredentialStore::new()),
///     PasswordHasher::new(),
///     Arc::new(news),
/// )?;
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use newsdesk_shared::{
    auth::{
        authorization::{enforce_policy, SecurityPolicy},
        jwt::{SigningKeyError, TokenIssuer, TokenValidator},
        middleware::authenticate,
        password::PasswordHasher,
        service::AuthService,
    },
    models::user::CredentialStore,
    news::NewsSearch,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every field is an
/// `Arc` or otherwise cheap to clone. Holds no per-request or per-user data.
#[derive(Clone)]
pub struct AppState {
    /// Register/login service
    pub auth: Arc<AuthService>,

    /// User records
    pub store: Arc<dyn CredentialStore>,

    /// Token validator used by the authentication middleware
    pub validator: Arc<TokenValidator>,

    /// Public/protected route table
    pub policy: Arc<SecurityPolicy>,

    /// Outbound news search
    pub news: Arc<dyn NewsSearch>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Fires on shutdown; aborts in-flight outbound calls
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Creates application state, deriving token keys from the configured secret
    ///
    /// # Errors
    ///
    /// Returns `SigningKeyError` if the signing secret is unusable
    pub fn new(
        config: Config,
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        news: Arc<dyn NewsSearch>,
    ) -> Result<Self, SigningKeyError> {
        let issuer = TokenIssuer::new(&config.jwt.secret)?;
        let validator = TokenValidator::new(&config.jwt.secret)?;

        Ok(Self {
            auth: Arc::new(AuthService::new(store.clone(), hasher, issuer)),
            store,
            validator: Arc::new(validator),
            policy: Arc::new(SecurityPolicy::default()),
            news,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// GET  /health             public
/// POST /api/register       public
/// POST /api/login          public
/// GET  /api/preferences    protected
/// PUT  /api/preferences    protected
/// GET  /api/news?q=...     protected
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. CORS (tower-http CorsLayer)
/// 2. Logging (tower-http TraceLayer)
/// 3. Authentication (installs `IdentityContext` when the bearer token is valid)
/// 4. Security policy (401 for protected routes without an identity)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/register", post(routes::auth::register))
        .route("/api/login", post(routes::auth::login))
        .route(
            "/api/preferences",
            get(routes::preferences::get_preferences).put(routes::preferences::update_preferences),
        )
        .route("/api/news", get(routes::news::search_news))
        .layer(middleware::from_fn_with_state(
            state.policy.clone(),
            enforce_policy,
        ))
        .layer(middleware::from_fn_with_state(
            state.validator.clone(),
            authenticate,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
