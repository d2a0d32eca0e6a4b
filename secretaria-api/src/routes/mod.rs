/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Welcome and health check endpoints
/// - `auth`: Registration, login, profile and password recovery
/// - `tasks`: Owner-scoped task CRUD and completion toggle
/// - `events`: Owner-scoped calendar events
/// - `upload`: Profile photo upload, retrieval and removal

pub mod auth;
pub mod events;
pub mod health;
pub mod tasks;
pub mod upload;
