/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/register` - Register new user
/// - `POST /api/login` - Login and get a bearer token

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register and login request body
///
/// Missing fields deserialize as empty strings so they surface as validation errors
/// rather than body rejections.
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    /// Login name
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Username must be 1-255 characters"))]
    pub username: String,

    /// Plaintext password
    #[serde(default)]
    #[validate(length(min = 1, max = 1024, message = "Password must be 1-1024 characters"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token (24h)
    pub token: String,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/register
/// Content-Type: application/json
///
/// { "username": "alice", "password": "s3cret" }
/// ```
///
/// # Response
///
/// `200 OK` with body `Registered`
///
/// # Errors
///
/// - `400 Bad Request`: Username already exists
/// - `422 Unprocessable Entity`: Blank username or password
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<&'static str> {
    req.validate()?;

    state.auth.register(&req.username, &req.password).await?;

    Ok("Registered")
}

/// Login and receive a bearer token
///
/// # Endpoint
///
/// ```text
/// POST /api/login
/// Content-Type: application/json
///
/// { "username": "alice", "password": "s3cret" }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user or wrong password (same response for both)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let token = state.auth.login(&req.username, &req.password).await?;

    Ok(Json(LoginResponse { token }))
}
