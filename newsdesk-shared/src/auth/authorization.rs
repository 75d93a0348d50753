/// Route security policy
///
/// A static table classifies each `(method, path)` pair as public or protected. The
/// [`enforce_policy`] middleware runs after [`super::middleware::authenticate`] and is
/// the single place where "no identity on a protected route" becomes a 401.
///
/// | Method | Path            | Access    |
/// |--------|-----------------|-----------|
/// | POST   | `/api/register` | public    |
/// | POST   | `/api/login`    | public    |
/// | GET    | `/health`       | public    |
/// | *      | anything else   | protected |
///
/// No session state is created or consulted; the decision depends only on the identity
/// the current request's token produced.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::middleware::IdentityContext;

/// Access class of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Reachable without an identity
    Public,

    /// Requires an authenticated identity
    Protected,
}

/// Error raised when a protected route is reached without an identity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Authentication required for {method} {path}")]
    Unauthenticated { method: String, path: String },
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Request rejected by security policy");

        // Same body for every rejection reason.
        let body = Json(json!({
            "error": "unauthorized",
            "message": "Authentication required",
        }));

        let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}

/// Static route classification table
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    public_routes: Vec<(Method, String)>,
}

impl SecurityPolicy {
    /// Creates a policy where only the listed routes are public
    pub fn with_public_routes<I, P>(routes: I) -> Self
    where
        I: IntoIterator<Item = (Method, P)>,
        P: Into<String>,
    {
        Self {
            public_routes: routes
                .into_iter()
                .map(|(method, path)| (method, path.into()))
                .collect(),
        }
    }

    /// Classifies a request target
    ///
    /// Matching is exact; unknown routes are protected.
    pub fn classify(&self, method: &Method, path: &str) -> RouteAccess {
        let is_public = self
            .public_routes
            .iter()
            .any(|(m, p)| m == method && p == path);

        if is_public {
            RouteAccess::Public
        } else {
            RouteAccess::Protected
        }
    }

    /// Decides whether a request may reach its handler
    pub fn check(
        &self,
        method: &Method,
        path: &str,
        identity: Option<&IdentityContext>,
    ) -> Result<(), AuthzError> {
        match (self.classify(method, path), identity) {
            (RouteAccess::Public, _) | (RouteAccess::Protected, Some(_)) => Ok(()),
            (RouteAccess::Protected, None) => Err(AuthzError::Unauthenticated {
                method: method.to_string(),
                path: path.to_string(),
            }),
        }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::with_public_routes([
            (Method::POST, "/api/register"),
            (Method::POST, "/api/login"),
            (Method::GET, "/health"),
        ])
    }
}

/// Security policy middleware
///
/// Must be layered inside (after) the authentication middleware.
pub async fn enforce_policy(
    State(policy): State<Arc<SecurityPolicy>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthzError> {
    policy.check(
        req.method(),
        req.uri().path(),
        req.extensions().get::<IdentityContext>(),
    )?;

    Ok(next.run(req).await)
}
