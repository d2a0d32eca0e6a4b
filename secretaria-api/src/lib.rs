//! # Secretaria AngLon API Server Library
//!
//! This library provides the user-facing HTTP service: accounts, tasks,
//! calendar events and profile photos.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod routes;
