//! # taskforge-client
//!
//! Client core for taskforge: the authoritative in-memory entity store,
//! the derived-view logic (virtual lists, search, sort, kanban), the
//! blocking evaluator, the gamification engine, and the mutation
//! coordinator that reconciles local state with the persistence service.
//!
//! The crate is UI-agnostic. An embedding frontend drives a [`Session`]
//! and receives [`events::SessionEvent`]s on a channel; rendering reads
//! immutable snapshots from the entity store and feeds them through
//! [`views::resolve`].
//!
//! [`Session`]: session::Session

pub mod api;
pub mod blocking;
pub mod commands;
pub mod events;
pub mod progression;
pub mod session;
pub mod settings;
pub mod state;
pub mod timer;
pub mod views;

mod error;

pub use error::{ClientError, Result};
pub use session::Session;
