//! # Secretaria AngLon Shared Library
//!
//! Types, persistence and business logic shared by the user API
//! (`secretaria-api`) and the admin API (`secretaria-admin`).
//!
//! ## Module Organization
//!
//! - `config`: Configuration sections read from the environment
//! - `db`: Connection pool and embedded migrations
//! - `models`: Database models and data structures
//! - `auth`: Password hashing, bearer tokens, authorization gate
//! - `services`: Operations returning typed `ServiceResult`s
//! - `mail`: Outbound notifications
//! - `error`: Service error taxonomy
//! - `web`: Tracing setup, CORS, security headers, shutdown signal

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mail;
pub mod models;
pub mod services;
pub mod web;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
