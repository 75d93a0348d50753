//! # Newsdesk Shared Library
//!
//! This crate contains the authentication core, the user store and the outbound
//! clients used by the Newsdesk API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, token issuance/validation, request middleware,
//!   route policy and the register/login service
//! - `models`: User records and the `CredentialStore` abstraction
//! - `db`: PostgreSQL pool and migrations
//! - `news`: Timeout-bounded, cancellable news search client

pub mod auth;
pub mod db;
pub mod models;
pub mod news;

/// Current version of the Newsdesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
