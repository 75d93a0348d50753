/// Database layer for the PostgreSQL credential store
///
/// # Modules
///
/// - `pool`: Connection pool creation, health check and shutdown
/// - `migrations`: Embedded schema migrations

pub mod migrations;
pub mod pool;
