use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use taskforge_shared::model::User;
use taskforge_shared::protocol::ProfilePatch;
use taskforge_shared::types::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, provider_id, email, name, picture, xp, level, daily_streak, badges, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user.id.to_string(),
                user.provider_id,
                user.email,
                user.name,
                user.picture,
                user.xp,
                user.level,
                user.daily_streak,
                serde_json::to_string(&user.badges)?,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, provider_id, email, name, picture, xp, level, daily_streak, badges, created_at
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Look a user up by identity-provider subject. Returns `Ok(None)`
    /// rather than an error so first-login detection stays a plain branch.
    pub fn get_user_by_provider_id(&self, provider_id: &str) -> Result<Option<User>> {
        let result = self.conn().query_row(
            "SELECT id, provider_id, email, name, picture, xp, level, daily_streak, badges, created_at
             FROM users WHERE provider_id = ?1",
            params![provider_id],
            row_to_user,
        );
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Apply a partial profile update and return the stored user.
    ///
    /// `xp` and `level` are written as reported by the client; the server
    /// does not recompute gamification (client-authoritative by design).
    pub fn update_user(&self, id: UserId, patch: &ProfilePatch) -> Result<User> {
        let mut user = self.get_user(id)?;

        if let Some(ref name) = patch.name {
            user.name = name.clone();
        }
        if let Some(ref picture) = patch.picture {
            user.picture = picture.clone();
        }
        if let Some(xp) = patch.xp {
            user.xp = xp;
        }
        if let Some(level) = patch.level {
            user.level = level.max(1);
        }
        if let Some(ref badges) = patch.badges {
            user.badges = badges.clone();
        }
        if let Some(streak) = patch.daily_streak {
            user.daily_streak = streak;
        }

        self.conn().execute(
            "UPDATE users SET name = ?2, picture = ?3, xp = ?4, level = ?5, daily_streak = ?6, badges = ?7
             WHERE id = ?1",
            params![
                id.to_string(),
                user.name,
                user.picture,
                user.xp,
                user.level,
                user.daily_streak,
                serde_json::to_string(&user.badges)?,
            ],
        )?;

        Ok(user)
    }
}

pub(crate) fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

pub(crate) fn parse_uuid(index: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_timestamp(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    index: usize,
    value: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let badges_str: String = row.get(8)?;
    let ts_str: String = row.get(9)?;

    Ok(User {
        id: UserId(parse_uuid(0, &id_str)?),
        provider_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        picture: row.get(4)?,
        xp: row.get(5)?,
        level: row.get(6)?,
        daily_streak: row.get(7)?,
        badges: parse_json(8, &badges_str)?,
        created_at: parse_timestamp(9, &ts_str)?,
    })
}
