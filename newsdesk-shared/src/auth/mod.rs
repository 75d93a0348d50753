/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 token issuance and staged validation
/// - [`middleware`]: Bearer-token middleware and the request-scoped `IdentityContext`
/// - [`authorization`]: Public/protected route table and its enforcement middleware
/// - [`service`]: Register/login orchestration
///
/// # Request pipeline
///
/// ```text
/// request -> authenticate (best effort) -> enforce_policy (401 if protected
///            and anonymous) -> handler (extracts IdentityContext)
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;
