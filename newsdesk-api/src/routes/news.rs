/// News search endpoint (authenticated)
///
/// # Endpoint
///
/// ```text
/// GET /api/news?q=rust
/// Authorization: Bearer eyJ...
/// ```
///
/// Responds with the upstream JSON body unchanged.
///
/// # Errors
///
/// - `401 Unauthorized`: No valid bearer token
/// - `422 Unprocessable Entity`: Missing or blank `q`
/// - `503 Service Unavailable`: Upstream timed out, failed, or is not configured

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use newsdesk_shared::auth::middleware::IdentityContext;
use serde::Deserialize;
use validator::Validate;

/// Query string
#[derive(Debug, Deserialize, Validate)]
pub struct NewsQuery {
    /// Search terms
    #[serde(default)]
    #[validate(length(max = 500, message = "Query must be at most 500 characters"))]
    pub q: String,
}

/// Searches news for the caller
pub async fn search_news(
    State(state): State<AppState>,
    identity: IdentityContext,
    Query(query): Query<NewsQuery>,
) -> ApiResult<Response> {
    query.validate()?;

    let terms = query.q.trim();
    if terms.is_empty() {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "q".to_string(),
            message: "Query must not be blank".to_string(),
        }]));
    }

    tracing::debug!(username = %identity.username, query = %terms, "News search");

    let raw = state.news.search(terms, &state.shutdown).await?;

    Ok(([(header::CONTENT_TYPE, "application/json")], raw).into_response())
}
