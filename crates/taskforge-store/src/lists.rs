use chrono::Utc;
use rusqlite::params;

use taskforge_shared::constants::LIST_ICON_FALLBACK;
use taskforge_shared::model::List;
use taskforge_shared::protocol::{ListPatch, NewList};
use taskforge_shared::types::{ListId, ListView, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::users::{not_found, parse_json, parse_timestamp, parse_uuid};

impl Database {
    pub fn create_list(&self, owner_id: UserId, new: &NewList) -> Result<List> {
        let list = List {
            id: ListId::new(),
            owner_id,
            name: new.name.clone(),
            icon: new
                .icon
                .clone()
                .unwrap_or_else(|| LIST_ICON_FALLBACK.to_string()),
            color: new.color.clone().unwrap_or_default(),
            default_view: new.default_view.unwrap_or_default(),
            shared_with: Vec::new(),
            created_at: Utc::now(),
        };
        self.insert_list(&list)?;
        Ok(list)
    }

    pub fn insert_list(&self, list: &List) -> Result<()> {
        self.conn().execute(
            "INSERT INTO lists (id, owner_id, name, icon, color, default_view, shared_with, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                list.id.to_string(),
                list.owner_id.to_string(),
                list.name,
                list.icon,
                list.color,
                view_to_str(list.default_view),
                serde_json::to_string(&list.shared_with)?,
                list.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_list(&self, owner_id: UserId, id: ListId) -> Result<List> {
        self.conn()
            .query_row(
                "SELECT id, owner_id, name, icon, color, default_view, shared_with, created_at
                 FROM lists WHERE id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id.to_string()],
                row_to_list,
            )
            .map_err(not_found)
    }

    pub fn get_lists(&self, owner_id: UserId) -> Result<Vec<List>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, owner_id, name, icon, color, default_view, shared_with, created_at
             FROM lists WHERE owner_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt.query_map(params![owner_id.to_string()], row_to_list)?;

        let mut lists = Vec::new();
        for row in rows {
            lists.push(row?);
        }
        Ok(lists)
    }

    /// Apply a partial update and return the stored list.
    pub fn update_list(&self, owner_id: UserId, id: ListId, patch: &ListPatch) -> Result<List> {
        let mut list = self.get_list(owner_id, id)?;

        if let Some(ref name) = patch.name {
            list.name = name.clone();
        }
        if let Some(ref icon) = patch.icon {
            list.icon = icon.clone();
        }
        if let Some(ref color) = patch.color {
            list.color = color.clone();
        }
        if let Some(view) = patch.default_view {
            list.default_view = view;
        }

        self.conn().execute(
            "UPDATE lists SET name = ?3, icon = ?4, color = ?5, default_view = ?6
             WHERE id = ?1 AND owner_id = ?2",
            params![
                id.to_string(),
                owner_id.to_string(),
                list.name,
                list.icon,
                list.color,
                view_to_str(list.default_view),
            ],
        )?;

        Ok(list)
    }

    /// Delete a list and every task under it in one transaction.
    ///
    /// The cascade is this layer's obligation; callers never delete the
    /// tasks themselves.
    pub fn delete_list(&mut self, owner_id: UserId, id: ListId) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        tx.execute(
            "DELETE FROM tasks WHERE list_id = ?1 AND owner_id = ?2",
            params![id.to_string(), owner_id.to_string()],
        )?;
        let affected = tx.execute(
            "DELETE FROM lists WHERE id = ?1 AND owner_id = ?2",
            params![id.to_string(), owner_id.to_string()],
        )?;

        if affected == 0 {
            // Nothing deleted: roll back so stray tasks are not lost to a
            // bad list id.
            tx.rollback()?;
            return Err(StoreError::NotFound);
        }

        tx.commit()?;
        Ok(())
    }
}

fn view_to_str(view: ListView) -> &'static str {
    match view {
        ListView::List => "list",
        ListView::Kanban => "kanban",
    }
}

fn view_from_str(index: usize, value: &str) -> rusqlite::Result<ListView> {
    match value {
        "list" => Ok(ListView::List),
        "kanban" => Ok(ListView::Kanban),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("unknown list view: {other}").into(),
        )),
    }
}

fn row_to_list(row: &rusqlite::Row<'_>) -> rusqlite::Result<List> {
    let id_str: String = row.get(0)?;
    let owner_str: String = row.get(1)?;
    let view_str: String = row.get(5)?;
    let shared_str: String = row.get(6)?;
    let ts_str: String = row.get(7)?;

    Ok(List {
        id: ListId(parse_uuid(0, &id_str)?),
        owner_id: UserId(parse_uuid(1, &owner_str)?),
        name: row.get(2)?,
        icon: row.get(3)?,
        color: row.get(4)?,
        default_view: view_from_str(5, &view_str)?,
        shared_with: parse_json(6, &shared_str)?,
        created_at: parse_timestamp(7, &ts_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_shared::model::User;

    pub(crate) fn db_with_user() -> (Database, UserId) {
        let db = Database::open_in_memory().unwrap();
        let user = User {
            id: UserId::new(),
            provider_id: "sub".into(),
            email: "a@b.c".into(),
            name: "A".into(),
            picture: String::new(),
            xp: 0,
            level: 1,
            daily_streak: 0,
            badges: Vec::new(),
            created_at: Utc::now(),
        };
        db.insert_user(&user).unwrap();
        (db, user.id)
    }

    #[test]
    fn create_fills_defaults() {
        let (db, owner) = db_with_user();
        let list = db
            .create_list(
                owner,
                &NewList {
                    name: "Groceries".into(),
                    ..NewList::default()
                },
            )
            .unwrap();

        assert_eq!(list.icon, "List");
        assert_eq!(list.default_view, ListView::List);

        let loaded = db.get_list(owner, list.id).unwrap();
        assert_eq!(loaded, list);
    }

    #[test]
    fn lists_are_owner_scoped() {
        let (db, owner) = db_with_user();
        let other = User {
            id: UserId::new(),
            provider_id: "sub2".into(),
            email: "b@b.c".into(),
            name: "B".into(),
            picture: String::new(),
            xp: 0,
            level: 1,
            daily_streak: 0,
            badges: Vec::new(),
            created_at: Utc::now(),
        };
        db.insert_user(&other).unwrap();

        let list = db
            .create_list(
                owner,
                &NewList {
                    name: "Mine".into(),
                    ..NewList::default()
                },
            )
            .unwrap();

        // Another user cannot see or update it; both read as not-found.
        assert!(matches!(
            db.get_list(other.id, list.id).unwrap_err(),
            StoreError::NotFound
        ));
        assert!(matches!(
            db.update_list(other.id, list.id, &ListPatch::default())
                .unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[test]
    fn update_renames() {
        let (db, owner) = db_with_user();
        let list = db
            .create_list(
                owner,
                &NewList {
                    name: "Old".into(),
                    ..NewList::default()
                },
            )
            .unwrap();

        let patch = ListPatch {
            name: Some("New".into()),
            ..ListPatch::default()
        };
        let updated = db.update_list(owner, list.id, &patch).unwrap();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.icon, list.icon);
    }
}
