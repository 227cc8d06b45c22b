/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded migration runner
///
/// Table access lives next to each model (`models::*`) and is reached through
/// the [`crate::store::postgres::PgStore`] backend.

pub mod migrations;
pub mod pool;
