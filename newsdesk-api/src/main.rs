//! # Newsdesk API Server
//!
//! Stateless bearer-token authentication in front of per-user preferences and a
//! news search proxy.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=... DATABASE_URL=postgres://... cargo run -p newsdesk-api
//! ```
//!
//! Without `DATABASE_URL` the server keeps users in memory.

use std::{sync::Arc, time::Duration};

use newsdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use newsdesk_shared::{
    auth::password::PasswordHasher,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::user::{CredentialStore, InMemoryCredentialStore, PgCredentialStore},
    news::{HttpNewsClient, NewsClientConfig},
};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration first so the log format can follow PRODUCTION
    let config = Config::from_env()?;
    let production = config.api.production;

    // Initialize tracing: JSON lines in production, human-readable otherwise
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsdesk_api=debug,newsdesk_shared=debug,tower_http=debug".into()),
        )
        .with(production.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!production).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        "Newsdesk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    tracing::debug!(api = ?config.api, news = ?config.news, "Configuration loaded");

    let (store, pool): (Arc<dyn CredentialStore>, Option<PgPool>) = match &config.database {
        Some(db) => {
            let pool = create_pool(DatabaseConfig {
                url: db.url.clone(),
                max_connections: db.max_connections,
                ..DatabaseConfig::default()
            })
            .await?;
            run_migrations(&pool).await?;
            tracing::info!("Using PostgreSQL credential store");
            (Arc::new(PgCredentialStore::new(pool.clone())), Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
            (Arc::new(InMemoryCredentialStore::new()), None)
        }
    };

    if config.news.api_key.is_none() {
        tracing::warn!("NEWS_API_KEY not set; news search will respond 503");
    }

    let news = HttpNewsClient::new(NewsClientConfig {
        base_url: config.news.api_url.clone(),
        api_key: config.news.api_key.clone(),
        timeout: Duration::from_secs(config.news.timeout_secs),
    })?;

    let addr = config.bind_address();
    let state = AppState::new(config, store, PasswordHasher::new(), Arc::new(news))?;
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received, draining connections...");
            shutdown.cancel();
        })
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}
