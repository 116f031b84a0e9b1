//! List operations.

use tracing::info;

use taskforge_shared::model::List;
use taskforge_shared::protocol::{ListPatch, NewList};
use taskforge_shared::types::ListId;

use crate::error::{ClientError, Result};
use crate::events::SessionEvent;
use crate::session::Session;

impl Session {
    pub async fn add_list(&self, name: &str) -> Result<List> {
        self.require_session()?;
        if name.trim().is_empty() {
            return Err(self.report(ClientError::Validation(
                "list name cannot be empty".into(),
            )));
        }

        let new = NewList {
            name: name.trim().to_string(),
            ..NewList::default()
        };
        let list = self.api.create_list(&new).await.map_err(|e| self.report(e))?;
        self.store.upsert_list(list.clone());
        self.events.emit(SessionEvent::ListsChanged);
        Ok(list)
    }

    pub async fn rename_list(&self, id: ListId, name: &str) -> Result<List> {
        if name.trim().is_empty() {
            return Err(self.report(ClientError::Validation(
                "list name cannot be empty".into(),
            )));
        }
        let patch = ListPatch {
            name: Some(name.trim().to_string()),
            ..ListPatch::default()
        };
        self.update_list(id, &patch).await
    }

    pub async fn update_list(&self, id: ListId, patch: &ListPatch) -> Result<List> {
        self.require_session()?;
        let lock = self.entity_lock(id.0);
        let _guard = lock.lock().await;

        let list = self
            .api
            .update_list(id, patch)
            .await
            .map_err(|e| self.report(e))?;
        self.store.upsert_list(list.clone());
        self.events.emit(SessionEvent::ListsChanged);
        Ok(list)
    }

    /// Delete a list. The server cascades to its tasks before
    /// confirming; on success the local mirror drops them too.
    pub async fn delete_list(&self, id: ListId) -> Result<()> {
        self.require_session()?;
        let lock = self.entity_lock(id.0);
        let _guard = lock.lock().await;

        self.api.delete_list(id).await.map_err(|e| self.report(e))?;
        self.store.remove_list(id);
        info!(list = %id, "list deleted");
        self.events.emit(SessionEvent::ListsChanged);
        self.events.emit(SessionEvent::TasksChanged);
        Ok(())
    }
}
