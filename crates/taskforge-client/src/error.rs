use thiserror::Error;

/// Errors surfaced by client operations.
///
/// Every failure is recovered at the operation boundary: the entity
/// store is never left partially updated, and nothing here is fatal to
/// the process.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Missing, invalid, or expired credential. The UI should return to
    /// the login state.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The server rejected the payload (empty title, malformed field).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Target entity does not exist or is not owned by the caller.
    #[error("not found")]
    NotFound,

    /// Network or server failure. No automatic retry; last-known-good
    /// state is kept.
    #[error("request failed: {0}")]
    Transient(String),

    /// Completion was rejected because the task has an incomplete
    /// blocker. No mutation was sent.
    #[error("task is blocked by an incomplete task")]
    Blocked,

    /// Operation requires a signed-in session.
    #[error("not signed in")]
    NotSignedIn,

    /// The referenced entity is missing from the local snapshot.
    #[error("no such entity in local state")]
    UnknownEntity,

    /// Local settings file could not be read or written.
    #[error("settings error: {0}")]
    Settings(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
