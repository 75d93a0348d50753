/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `preferences`: Per-user preferences (authenticated)
/// - `news`: News search proxy (authenticated)

pub mod auth;
pub mod health;
pub mod news;
pub mod preferences;
