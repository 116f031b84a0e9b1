//! Mutation coordinator operations, grouped by domain. Each module adds
//! an `impl` block to [`Session`](crate::session::Session).

pub mod lists;
pub mod profile;
pub mod tasks;
