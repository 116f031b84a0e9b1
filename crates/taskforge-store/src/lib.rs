//! # taskforge-store
//!
//! Server-side persistence for taskforge, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed, owner-scoped CRUD helpers
//! for every domain model. Collection-valued fields (tags, subtasks,
//! blocked-by references, badges) are stored as JSON text columns.
//!
//! Deleting a list cascades to its tasks inside a single transaction;
//! the cascade is an obligation of this layer, not of callers.

pub mod database;
pub mod lists;
pub mod migrations;
pub mod sessions;
pub mod tasks;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
