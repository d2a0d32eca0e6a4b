/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: Embedded schema migrations
///
/// Models are in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
