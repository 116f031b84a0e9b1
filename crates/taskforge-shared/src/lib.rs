//! # taskforge-shared
//!
//! Domain model and wire protocol shared by the taskforge client and
//! server: entity ids, the `User`/`List`/`Task` types, and the
//! request/response payloads exchanged over the REST API.

pub mod constants;
pub mod model;
pub mod protocol;
pub mod types;

pub use model::*;
pub use types::*;
