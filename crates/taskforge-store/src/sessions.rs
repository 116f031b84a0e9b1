//! Opaque bearer-token sessions.
//!
//! Tokens are random UUIDs stored server-side with an expiry, so an
//! unknown token and an expired token can be told apart from a missing
//! one at the API layer.

use chrono::{Duration, Utc};
use rusqlite::params;
use uuid::Uuid;

use taskforge_shared::constants::SESSION_TTL_DAYS;
use taskforge_shared::types::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::users::{parse_timestamp, parse_uuid};

/// Outcome of a token lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Valid(UserId),
    Expired,
    Unknown,
}

impl Database {
    /// Create a session for `user_id` and return the token.
    pub fn create_session(&self, user_id: UserId) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

        self.conn().execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![token, user_id.to_string(), expires_at.to_rfc3339()],
        )?;
        Ok(token)
    }

    /// Resolve a bearer token to its user, distinguishing expired from
    /// unknown tokens.
    pub fn lookup_session(&self, token: &str) -> Result<SessionLookup> {
        let result = self.conn().query_row(
            "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
            params![token],
            |row| {
                let user_str: String = row.get(0)?;
                let exp_str: String = row.get(1)?;
                Ok((parse_uuid(0, &user_str)?, parse_timestamp(1, &exp_str)?))
            },
        );

        match result {
            Ok((user_id, expires_at)) => {
                if expires_at < Utc::now() {
                    Ok(SessionLookup::Expired)
                } else {
                    Ok(SessionLookup::Valid(UserId(user_id)))
                }
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(SessionLookup::Unknown),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Delete a session (logout). Returns whether a row was removed.
    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(affected > 0)
    }

    /// Remove all expired sessions. Called periodically by the server.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(affected)
    }

    #[cfg(test)]
    fn set_session_expiry(&self, token: &str, expires_at: chrono::DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET expires_at = ?2 WHERE token = ?1",
            params![token, expires_at.to_rfc3339()],
        )?;
        Ok(())
    }
}
