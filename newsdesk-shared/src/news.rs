/// News search client
///
/// Thin wrapper over a third-party news search HTTP API. The response body is passed
/// through untouched. Every call is bounded by a timeout and races a
/// [`CancellationToken`], so a slow upstream cannot pin request handlers.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use newsdesk_shared::news::{HttpNewsClient, NewsClientConfig, NewsSearch};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpNewsClient::new(NewsClientConfig {
///     base_url: "https://newsapi.org/v2/everything".to_string(),
///     api_key: Some("your-api-key".to_string()),
///     timeout: Duration::from_secs(10),
/// })?;
///
/// let raw = client.search("rust", &CancellationToken::new()).await?;
/// println!("{}", raw);
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default upstream timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for news search
#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    /// No API key configured
    #[error("News search is not configured")]
    NotConfigured,

    /// Upstream did not answer in time
    #[error("News search timed out after {0:?}")]
    Timeout(Duration),

    /// Call was cancelled (shutdown)
    #[error("News search cancelled")]
    Cancelled,

    /// Transport failure or non-success status
    #[error("News upstream error: {0}")]
    Upstream(String),
}

/// Outbound news search
#[async_trait]
pub trait NewsSearch: Send + Sync {
    /// Runs `query` upstream and returns the raw response body
    async fn search(&self, query: &str, cancel: &CancellationToken) -> Result<String, NewsError>;
}

/// Upstream endpoint settings
#[derive(Debug, Clone)]
pub struct NewsClientConfig {
    /// Search endpoint URL
    pub base_url: String,

    /// API key sent as the `apiKey` query parameter
    pub api_key: Option<String>,

    /// Per-call timeout
    pub timeout: Duration,
}

/// `reqwest`-backed [`NewsSearch`]
#[derive(Debug, Clone)]
pub struct HttpNewsClient {
    http: reqwest::Client,
    config: NewsClientConfig,
}

impl HttpNewsClient {
    /// Builds the client
    ///
    /// # Errors
    ///
    /// Returns `NewsError::Upstream` if the HTTP client cannot be constructed
    pub fn new(config: NewsClientConfig) -> Result<Self, NewsError> {
        // The whole-call bound is enforced in `search`; reqwest only limits connecting.
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| NewsError::Upstream(e.to_string()))?;

        Ok(Self { http, config })
    }

    async fn fetch(&self, query: &str, api_key: &str) -> Result<String, NewsError> {
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[("q", query), ("apiKey", api_key)])
            .send()
            .await
            .map_err(|e| NewsError::Upstream(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsError::Upstream(format!("upstream returned {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| NewsError::Upstream(e.without_url().to_string()))
    }
}

#[async_trait]
impl NewsSearch for HttpNewsClient {
    async fn search(&self, query: &str, cancel: &CancellationToken) -> Result<String, NewsError> {
        let api_key = self.config.api_key.as_deref().ok_or(NewsError::NotConfigured)?;
        let timeout = self.config.timeout;

        debug!(query = %query, "Searching news");

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("News search cancelled");
                Err(NewsError::Cancelled)
            }
            result = tokio::time::timeout(timeout, self.fetch(query, api_key)) => {
                match result {
                    Ok(inner) => inner,
                    Err(_) => {
                        warn!(timeout_ms = timeout.as_millis() as u64, "News search timed out");
                        Err(NewsError::Timeout(timeout))
                    }
                }
            }
        }
    }
}
