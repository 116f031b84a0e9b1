//! Task operations, including the completion path with its blocking
//! gate and gamification hook.

use tracing::{debug, info};

use taskforge_shared::model::{Subtask, Task};
use taskforge_shared::protocol::{NewTask, TaskPatch};
use taskforge_shared::types::{ListId, Priority, TaskId, TaskStatus};

use crate::blocking::is_blocked;
use crate::error::{ClientError, Result};
use crate::events::SessionEvent;
use crate::session::Session;
use crate::settings::TaskTemplate;

impl Session {
    /// Create a task under a concrete list. Tasks are never created
    /// under a virtual list; the signature makes that unrepresentable.
    pub async fn add_task(&self, list_id: ListId, title: &str) -> Result<Task> {
        self.require_session()?;
        if title.trim().is_empty() {
            return Err(self.report(ClientError::Validation(
                "task title cannot be empty".into(),
            )));
        }

        let new = NewTask::titled(Some(list_id), title.trim());
        self.create_task(&new).await
    }

    /// Instantiate a saved template under a concrete list.
    pub async fn add_task_from_template(
        &self,
        template: &TaskTemplate,
        list_id: ListId,
    ) -> Result<Task> {
        self.require_session()?;
        self.create_task(&template.instantiate(list_id)).await
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task> {
        let task = self.api.create_task(new).await.map_err(|e| self.report(e))?;
        self.store.upsert_task(task.clone());
        self.events.emit(SessionEvent::TasksChanged);
        Ok(task)
    }

    /// Flip a task's completion state.
    ///
    /// Completing a blocked task is rejected before anything is sent.
    /// On the false-to-true transition the gamification engine fires,
    /// gated on the pre-mutation `completed` read under the entity lock
    /// so a double invocation cannot double-award.
    pub async fn toggle_completed(&self, id: TaskId) -> Result<Task> {
        self.require_session()?;
        let lock = self.entity_lock(id.0);
        let _guard = lock.lock().await;

        let (completing, priority) = {
            let snapshot = self.store.snapshot();
            let task = snapshot
                .tasks
                .iter()
                .find(|t| t.id == id)
                .ok_or(ClientError::UnknownEntity)?;

            if !task.completed && is_blocked(task, &snapshot.tasks) {
                debug!(task = %id, "completion rejected: task is blocked");
                self.events.emit(SessionEvent::TaskBlocked { task_id: id });
                return Err(ClientError::Blocked);
            }
            (!task.completed, task.priority)
        };

        let updated = self
            .api
            .update_task(id, &TaskPatch::completed(completing))
            .await
            .map_err(|e| self.report(e))?;
        self.store.upsert_task(updated.clone());
        self.events.emit(SessionEvent::TasksChanged);

        if completing {
            self.award_completion(priority).await?;
        }
        Ok(updated)
    }

    pub async fn toggle_important(&self, id: TaskId) -> Result<Task> {
        let current = {
            let snapshot = self.store.snapshot();
            snapshot
                .tasks
                .iter()
                .find(|t| t.id == id)
                .ok_or(ClientError::UnknownEntity)?
                .important
        };
        let patch = TaskPatch {
            important: Some(!current),
            ..TaskPatch::default()
        };
        self.update_task(id, &patch).await
    }

    pub async fn set_priority(&self, id: TaskId, priority: Priority) -> Result<Task> {
        let patch = TaskPatch {
            priority: Some(priority),
            ..TaskPatch::default()
        };
        self.update_task(id, &patch).await
    }

    pub async fn update_note(&self, id: TaskId, note: &str) -> Result<Task> {
        let patch = TaskPatch {
            note: Some(note.to_string()),
            ..TaskPatch::default()
        };
        self.update_task(id, &patch).await
    }

    /// Move a task between kanban columns. Deliberately leaves
    /// `completed` alone: the board and the checklist are independent
    /// projections.
    pub async fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<Task> {
        self.update_task(id, &TaskPatch::status(status)).await
    }

    /// Generic partial update. Editing a blocked task is never
    /// restricted; only the completion path consults the evaluator.
    pub async fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        self.require_session()?;
        if matches!(&patch.blocked_by, Some(ids) if ids.contains(&id)) {
            return Err(self.report(ClientError::Validation(
                "a task cannot block itself".into(),
            )));
        }

        let lock = self.entity_lock(id.0);
        let _guard = lock.lock().await;

        let task = self
            .api
            .update_task(id, patch)
            .await
            .map_err(|e| self.report(e))?;
        self.store.upsert_task(task.clone());
        self.events.emit(SessionEvent::TasksChanged);
        Ok(task)
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<()> {
        self.require_session()?;
        let lock = self.entity_lock(id.0);
        let _guard = lock.lock().await;

        self.api.delete_task(id).await.map_err(|e| self.report(e))?;
        self.store.remove_task(id);
        info!(task = %id, "task deleted");
        self.events.emit(SessionEvent::TasksChanged);
        Ok(())
    }

    /// Append a subtask.
    ///
    /// Subtasks are not independent entities: this is a read-modify-write
    /// of the parent's full array, re-read from the current snapshot
    /// under the entity lock so rapid edits cannot clobber each other.
    pub async fn add_subtask(&self, task_id: TaskId, title: &str) -> Result<Task> {
        self.require_session()?;
        if title.trim().is_empty() {
            return Err(self.report(ClientError::Validation(
                "subtask title cannot be empty".into(),
            )));
        }

        let lock = self.entity_lock(task_id.0);
        let _guard = lock.lock().await;

        let mut subtasks = self.current_subtasks(task_id)?;
        subtasks.push(Subtask {
            id: TaskId::new(),
            title: title.trim().to_string(),
            completed: false,
        });
        self.patch_subtasks(task_id, subtasks).await
    }

    /// Flip one subtask's completion state.
    pub async fn toggle_subtask(&self, task_id: TaskId, subtask_id: TaskId) -> Result<Task> {
        self.require_session()?;
        let lock = self.entity_lock(task_id.0);
        let _guard = lock.lock().await;

        let mut subtasks = self.current_subtasks(task_id)?;
        let subtask = subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or(ClientError::UnknownEntity)?;
        subtask.completed = !subtask.completed;
        self.patch_subtasks(task_id, subtasks).await
    }

    fn current_subtasks(&self, task_id: TaskId) -> Result<Vec<Subtask>> {
        let snapshot = self.store.snapshot();
        snapshot
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .map(|t| t.subtasks.clone())
            .ok_or(ClientError::UnknownEntity)
    }

    async fn patch_subtasks(&self, task_id: TaskId, subtasks: Vec<Subtask>) -> Result<Task> {
        let patch = TaskPatch {
            subtasks: Some(subtasks),
            ..TaskPatch::default()
        };
        let task = self
            .api
            .update_task(task_id, &patch)
            .await
            .map_err(|e| self.report(e))?;
        self.store.upsert_task(task.clone());
        self.events.emit(SessionEvent::TasksChanged);
        Ok(task)
    }
}
