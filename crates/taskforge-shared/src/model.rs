//! Domain entities persisted by the server and mirrored in the client's
//! entity store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ListId, ListView, Priority, Recurrence, TaskId, TaskStatus, UserId};

/// A signed-in user and their gamification progression.
///
/// `xp` and `level` are computed on the client when a task is completed
/// and persisted back as-is; the server stores whatever the client
/// reports (see the design notes on client-trusted gamification).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    /// Subject claim from the identity provider. Stable across logins.
    pub provider_id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub xp: u32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub daily_streak: u32,
    #[serde(default)]
    pub badges: Vec<String>,
    pub created_at: DateTime<Utc>,
}

fn default_level() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct List {
    pub id: ListId,
    pub owner_id: UserId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub default_view: ListView,
    /// Present in the data model but not exercised by any core operation.
    #[serde(default)]
    pub shared_with: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subtask {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub url: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub owner_id: UserId,
    /// A task without a list is visible in every concrete list view.
    #[serde(default)]
    pub list_id: Option<ListId>,
    pub title: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Free-form time-of-day string, e.g. "14:30".
    #[serde(default)]
    pub due_time: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub status: TaskStatus,
    /// Accumulated focus-timer seconds.
    #[serde(default)]
    pub time_spent: u64,
    /// Ids of tasks that must be completed before this one can be.
    /// May contain stale ids; those never block (fail-open).
    #[serde(default)]
    pub blocked_by: Vec<TaskId>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Minimal task for building up a new entity client-side before it is
    /// sent to the server. Tests use this heavily.
    pub fn new(owner_id: UserId, list_id: Option<ListId>, title: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            owner_id,
            list_id,
            title: title.into(),
            note: String::new(),
            completed: false,
            important: false,
            priority: Priority::Low,
            due_date: None,
            due_time: None,
            tags: Vec::new(),
            recurrence: Recurrence::None,
            status: TaskStatus::Todo,
            time_spent: 0,
            blocked_by: Vec::new(),
            subtasks: Vec::new(),
            attachments: Vec::new(),
            location: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_defaults_survive_sparse_json() {
        let json = format!(
            r#"{{"id":"{}","owner_id":"{}","title":"buy milk","created_at":"2026-01-05T10:00:00Z"}}"#,
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4(),
        );
        let task: Task = serde_json::from_str(&json).unwrap();
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.recurrence, Recurrence::None);
        assert!(task.list_id.is_none());
        assert!(task.blocked_by.is_empty());
    }

    #[test]
    fn user_level_defaults_to_one() {
        let json = format!(
            r#"{{"id":"{}","provider_id":"sub-1","email":"a@b.c","name":"A","created_at":"2026-01-05T10:00:00Z"}}"#,
            uuid::Uuid::new_v4(),
        );
        let user: User = serde_json::from_str(&json).unwrap();
        assert_eq!(user.level, 1);
        assert_eq!(user.xp, 0);
    }
}
