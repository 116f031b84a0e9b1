//! The mutation coordinator.
//!
//! A [`Session`] owns the API client, the entity store, the event
//! channel, the focus timer, and local settings. Every mutation follows
//! the same shape: build a minimal partial payload, send it, and on
//! success replace the local entity with the server's authoritative
//! response. On failure the store is untouched and an error event is
//! emitted; there is no automatic retry.
//!
//! Rapid sequential mutations to the same entity are serialized through
//! a per-entity-id async lock, so they cannot arrive at the server out
//! of issue order.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use taskforge_shared::model::Task;
use taskforge_shared::protocol::TaskPatch;
use taskforge_shared::types::TaskId;

use crate::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::events::{self, EventSender, SessionEvent};
use crate::settings::{LocalSettings, TaskTemplate, Theme};
use crate::state::EntityStore;
use crate::timer::FocusTimer;

pub struct Session {
    pub(crate) api: ApiClient,
    pub(crate) store: EntityStore,
    pub(crate) events: EventSender,
    locks: EntityLocks,
    timer: Mutex<Option<FocusTimer>>,
    settings: Mutex<LocalSettings>,
    settings_path: PathBuf,
}

impl Session {
    /// Create a session against `base_url`, loading local settings from
    /// the platform data directory.
    pub fn new(base_url: impl Into<String>) -> Result<(Self, UnboundedReceiver<SessionEvent>)> {
        let path = LocalSettings::default_path()?;
        Self::with_settings_path(base_url, path)
    }

    /// Create a session with an explicit settings path. Tests use this.
    pub fn with_settings_path(
        base_url: impl Into<String>,
        settings_path: PathBuf,
    ) -> Result<(Self, UnboundedReceiver<SessionEvent>)> {
        let settings = LocalSettings::load(&settings_path)?;
        let (events, rx) = events::channel();

        let session = Self {
            api: ApiClient::new(base_url),
            store: EntityStore::new(),
            events,
            locks: EntityLocks::default(),
            timer: Mutex::new(None),
            settings: Mutex::new(settings),
            settings_path,
        };
        Ok((session, rx))
    }

    /// Read access for rendering.
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Serialize mutations per entity id.
    pub(crate) fn entity_lock(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.get(id)
    }

    /// Classify an operation failure: emit the matching event and pass
    /// the error through to the caller.
    pub(crate) fn report(&self, error: ClientError) -> ClientError {
        match &error {
            ClientError::Auth(_) => self.events.emit(SessionEvent::SessionExpired),
            ClientError::Blocked => {}
            other => self.events.emit(SessionEvent::Error {
                message: other.to_string(),
            }),
        }
        error
    }

    // -- local settings ----------------------------------------------

    pub fn theme(&self) -> Theme {
        self.settings.lock().expect("settings lock poisoned").theme
    }

    pub fn toggle_theme(&self) -> Result<Theme> {
        let mut guard = self.settings.lock().expect("settings lock poisoned");
        guard.theme = guard.theme.toggled();
        let theme = guard.theme;
        guard.save(&self.settings_path)?;
        Ok(theme)
    }

    pub fn templates(&self) -> Vec<TaskTemplate> {
        self.settings
            .lock()
            .expect("settings lock poisoned")
            .templates
            .clone()
    }

    /// Snapshot a task's shape as a reusable template.
    pub fn save_template(&self, task: &Task) -> Result<TaskTemplate> {
        let template = TaskTemplate::from_task(task);
        let mut guard = self.settings.lock().expect("settings lock poisoned");
        guard.templates.push(template.clone());
        guard.save(&self.settings_path)?;
        Ok(template)
    }

    pub fn remove_template(&self, index: usize) -> Result<()> {
        let mut guard = self.settings.lock().expect("settings lock poisoned");
        if index >= guard.templates.len() {
            return Err(ClientError::UnknownEntity);
        }
        guard.templates.remove(index);
        guard.save(&self.settings_path)?;
        Ok(())
    }

    // -- focus timer --------------------------------------------------

    /// Start timing a task. A running timer is flushed (its elapsed
    /// seconds persisted) before the new one starts.
    pub async fn start_timer(&self, task_id: TaskId) -> Result<()> {
        {
            let snapshot = self.store.snapshot();
            if !snapshot.tasks.iter().any(|t| t.id == task_id) {
                return Err(ClientError::UnknownEntity);
            }
        }

        self.stop_timer().await?;

        let mut guard = self.timer.lock().expect("timer lock poisoned");
        *guard = Some(FocusTimer::start(task_id));
        Ok(())
    }

    /// Advance the running timer by one second of wall-clock time. The
    /// embedding UI calls this from its 1-second tick.
    pub fn tick_timer(&self) -> Option<u64> {
        let mut guard = self.timer.lock().expect("timer lock poisoned");
        guard.as_mut().map(|timer| {
            timer.tick();
            timer.elapsed_secs()
        })
    }

    pub fn active_timer_task(&self) -> Option<TaskId> {
        self.timer
            .lock()
            .expect("timer lock poisoned")
            .as_ref()
            .map(|t| t.task_id())
    }

    /// Stop the running timer, if any, and bank its elapsed seconds into
    /// the task's `time_spent`. Returns the updated task.
    pub async fn stop_timer(&self) -> Result<Option<Task>> {
        let timer = self.timer.lock().expect("timer lock poisoned").take();
        let Some(timer) = timer else {
            return Ok(None);
        };
        let (task_id, elapsed) = timer.finish();
        if elapsed == 0 {
            return Ok(None);
        }

        let lock = self.entity_lock(task_id.0);
        let _guard = lock.lock().await;

        let current = {
            let snapshot = self.store.snapshot();
            match snapshot.tasks.iter().find(|t| t.id == task_id) {
                Some(task) => task.time_spent,
                // Task vanished while the timer ran; nothing to bank.
                None => return Ok(None),
            }
        };

        let patch = TaskPatch {
            time_spent: Some(current + elapsed),
            ..TaskPatch::default()
        };
        let updated = self
            .api
            .update_task(task_id, &patch)
            .await
            .map_err(|e| self.report(e))?;
        self.store.upsert_task(updated.clone());
        self.events.emit(SessionEvent::TasksChanged);
        Ok(Some(updated))
    }
}

/// Map of per-entity async locks. Lock objects are created lazily and
/// kept for the session's lifetime (entity counts are small).
#[derive(Default)]
struct EntityLocks {
    inner: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl EntityLocks {
    fn get(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        self.inner
            .lock()
            .expect("entity lock map poisoned")
            .entry(id)
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> (Session, UnboundedReceiver<SessionEvent>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        Session::with_settings_path("http://localhost:0", path).unwrap()
    }

    #[test]
    fn entity_locks_are_shared_per_id() {
        let locks = EntityLocks::default();
        let id = Uuid::new_v4();
        let a = locks.get(id);
        let b = locks.get(id);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &locks.get(Uuid::new_v4())));
    }

    #[test]
    fn tick_without_timer_is_none() {
        let (session, _rx) = session();
        assert!(session.tick_timer().is_none());
        assert!(session.active_timer_task().is_none());
    }

    #[tokio::test]
    async fn start_timer_requires_known_task() {
        let (session, _rx) = session();
        let err = session.start_timer(TaskId::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownEntity));
    }

    #[tokio::test]
    async fn stop_with_zero_elapsed_sends_nothing() {
        let (session, _rx) = session();
        let task = Task::new(taskforge_shared::types::UserId::new(), None, "t");
        session.store.upsert_task(task.clone());

        session.start_timer(task.id).await.unwrap();
        // No ticks: stopping must not touch the network (an attempt
        // against the dead base_url would error).
        assert!(session.stop_timer().await.unwrap().is_none());
    }

    #[test]
    fn report_classifies_auth_as_session_expired() {
        let (session, mut rx) = session();
        session.report(ClientError::Auth("expired".into()));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::SessionExpired);

        session.report(ClientError::Transient("boom".into()));
        assert!(matches!(
            rx.try_recv().unwrap(),
            SessionEvent::Error { .. }
        ));
    }
}
