/// Admin route handlers
///
/// - `health`: Welcome and health check
/// - `users`: Admin login and user management
/// - `system`: Statistics and audit log

pub mod health;
pub mod system;
pub mod users;
