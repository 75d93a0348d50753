/// Bearer-token authentication middleware for Axum
///
/// Runs once per request before the handler. It resolves an identity on a best-effort
/// basis and never rejects: a missing, malformed, forged or expired token simply leaves
/// the request without an [`IdentityContext`]. Whether that is acceptable for the route
/// is decided afterwards by [`super::authorization::enforce_policy`].
///
/// The identity lives only in the request's extensions, so it is dropped with the
/// request and can never be observed by another one.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Router};
/// use newsdesk_shared::auth::jwt::TokenValidator;
/// use newsdesk_shared::auth::middleware::{authenticate, IdentityContext};
///
/// async fn whoami(identity: IdentityContext) -> String {
///     identity.username
/// }
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let validator = Arc::new(TokenValidator::new("your-secret-key-at-least-32-bytes-long")?);
///
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(validator, authenticate));
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};

use super::authorization::AuthzError;
use super::jwt::{Claims, TokenValidator};

/// Role carried by an authenticated identity
///
/// Every authenticated caller holds the single `User` role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
}

/// Authenticated caller for the current request
///
/// Handlers take it as an extractor argument. Extraction fails with a 401 if the
/// middleware did not install one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityContext {
    /// Token subject
    pub username: String,

    /// Granted roles
    pub roles: Vec<Role>,
}

impl IdentityContext {
    /// Builds the identity for a validated token
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            username: claims.sub.clone(),
            roles: vec![Role::User],
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for IdentityContext
where
    S: Send + Sync,
{
    type Rejection = AuthzError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .cloned()
            .ok_or_else(|| AuthzError::Unauthenticated {
                method: parts.method.to_string(),
                path: parts.uri.path().to_string(),
            })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
///
/// Returns `None` for a missing header, a non-UTF-8 value, another scheme or an empty
/// token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Installs an [`IdentityContext`] when the request carries a valid bearer token and
/// passes the request through untouched otherwise.
pub async fn authenticate(
    State(validator): State<Arc<TokenValidator>>,
    mut req: Request,
    next: Next,
) -> Response {
    // Never trust an identity that did not come from this middleware.
    req.extensions_mut().remove::<IdentityContext>();

    if let Some(token) = bearer_token(req.headers()) {
        match validator.validate(token) {
            Ok(claims) => {
                let identity = IdentityContext::from_claims(&claims);
                tracing::debug!(username = %identity.username, "Request authenticated");
                req.extensions_mut().insert(identity);
            }
            Err(e) => {
                tracing::debug!(
                    reason = e.as_str(),
                    path = %req.uri().path(),
                    "Bearer token rejected, continuing without identity"
                );
            }
        }
    }

    next.run(req).await
}
