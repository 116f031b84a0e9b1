//! Client-local persisted state: theme preference and saved task
//! templates. Lives in a JSON file under the platform data directory,
//! entirely outside the entity store.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use taskforge_shared::model::{Subtask, Task};
use taskforge_shared::protocol::NewTask;
use taskforge_shared::types::{ListId, Priority, TaskId};

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// A reusable snapshot of a task's shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskTemplate {
    pub title: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    /// Subtask titles only; completion state is never templated.
    #[serde(default)]
    pub subtask_titles: Vec<String>,
}

impl TaskTemplate {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            note: task.note.clone(),
            tags: task.tags.clone(),
            priority: task.priority,
            subtask_titles: task.subtasks.iter().map(|s| s.title.clone()).collect(),
        }
    }

    /// Instantiate the template as a creation payload for a concrete
    /// list.
    pub fn instantiate(&self, list_id: ListId) -> NewTask {
        let mut new = NewTask::titled(Some(list_id), self.title.clone());
        new.note = Some(self.note.clone());
        new.tags = Some(self.tags.clone());
        new.priority = Some(self.priority);
        new.subtasks = Some(
            self.subtask_titles
                .iter()
                .map(|title| Subtask {
                    id: TaskId::new(),
                    title: title.clone(),
                    completed: false,
                })
                .collect(),
        );
        new
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LocalSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub templates: Vec<TaskTemplate>,
}

impl LocalSettings {
    /// Platform-appropriate settings path, e.g.
    /// `~/.local/share/taskforge/settings.json` on Linux.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "taskforge", "taskforge")
            .ok_or_else(|| ClientError::Settings("no data directory".into()))?;
        Ok(dirs.data_dir().join("settings.json"))
    }

    /// Load from disk; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| ClientError::Settings(format!("corrupt settings file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ClientError::Settings(e.to_string())),
        }
    }

    /// Persist atomically: write a temp file, then rename over the old
    /// one.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ClientError::Settings(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ClientError::Settings(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| ClientError::Settings(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| ClientError::Settings(e.to_string()))?;
        Ok(())
    }
}
