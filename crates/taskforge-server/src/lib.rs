//! # taskforge-server
//!
//! Persistence service for taskforge: identity exchange, session
//! tokens, and owner-scoped CRUD over lists and tasks (including the
//! list-delete cascade) behind an axum REST API.
//!
//! The binary in `main.rs` wires this up against a configuration loaded
//! from the environment; tests mount [`api::build_router`] directly.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;

pub use api::AppState;
pub use config::ServerConfig;
pub use error::ServerError;
