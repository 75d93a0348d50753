/// Data models for Newsdesk
///
/// # Models
///
/// - `user`: User accounts, the `CredentialStore` trait and its implementations

pub mod user;
