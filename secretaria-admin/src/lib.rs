//! # Secretaria AngLon Admin Server Library
//!
//! Administrative HTTP service, bound to its own port: user management,
//! live statistics and the audit log. Every route except login and health
//! requires an admin-scoped token held by an active administrator.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod routes;
