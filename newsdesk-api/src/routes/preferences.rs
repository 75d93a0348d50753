/// Per-user preference endpoints (authenticated)
///
/// The user is always the caller identified by the bearer token; there is no way to
/// address another user's preferences.
///
/// # Endpoints
///
/// - `GET /api/preferences` - Current preferences string
/// - `PUT /api/preferences` - Replace the preferences string

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use newsdesk_shared::auth::middleware::IdentityContext;
use serde::Deserialize;
use validator::Validate;

/// Update preferences request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePreferencesRequest {
    /// New preferences string
    #[serde(default)]
    #[validate(length(max = 10000, message = "Preferences must be at most 10000 characters"))]
    pub preferences: String,
}

/// Returns the caller's preferences
///
/// Responds with the raw string, or an empty body if none were ever set.
pub async fn get_preferences(
    State(state): State<AppState>,
    identity: IdentityContext,
) -> ApiResult<String> {
    let user = state.store.find_by_username(&identity.username).await?;

    Ok(user.preferences.unwrap_or_default())
}

/// Replaces the caller's preferences
///
/// # Endpoint
///
/// ```text
/// PUT /api/preferences
/// Authorization: Bearer eyJ...
/// Content-Type: application/json
///
/// { "preferences": "tech" }
/// ```
///
/// # Response
///
/// `200 OK` with body `Preferences updated`
pub async fn update_preferences(
    State(state): State<AppState>,
    identity: IdentityContext,
    Json(req): Json<UpdatePreferencesRequest>,
) -> ApiResult<&'static str> {
    req.validate()?;

    state
        .store
        .update_preferences(&identity.username, &req.preferences)
        .await?;

    tracing::debug!(username = %identity.username, "Preferences updated");
    Ok("Preferences updated")
}
