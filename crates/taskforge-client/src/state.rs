//! The entity store: authoritative local collections for the signed-in
//! user.
//!
//! Every mutation builds a fresh [`Snapshot`] and swaps it in atomically,
//! so a reader holding an `Arc<Snapshot>` never observes a partial
//! update. Only the mutation coordinator writes here, and only with
//! server-returned authoritative entities; no validation or I/O lives in
//! this module.

use std::sync::{Arc, RwLock};

use taskforge_shared::model::{List, Task, User};
use taskforge_shared::types::{ListId, TaskId};

/// One immutable view of the current user's data.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub user: Option<User>,
    pub lists: Vec<List>,
    pub tasks: Vec<Task>,
}

/// Single source of truth for rendering.
#[derive(Default)]
pub struct EntityStore {
    current: RwLock<Arc<Snapshot>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.read().expect("store lock poisoned").clone()
    }

    fn apply(&self, mutate: impl FnOnce(&mut Snapshot)) {
        let mut guard = self.current.write().expect("store lock poisoned");
        let mut next = (**guard).clone();
        mutate(&mut next);
        *guard = Arc::new(next);
    }

    pub fn set_user(&self, user: User) {
        self.apply(|s| s.user = Some(user));
    }

    pub fn replace_lists(&self, lists: Vec<List>) {
        self.apply(|s| s.lists = lists);
    }

    pub fn replace_tasks(&self, tasks: Vec<Task>) {
        self.apply(|s| s.tasks = tasks);
    }

    /// Insert or replace a task by id, preserving positions of existing
    /// entries (sort stability depends on this).
    pub fn upsert_task(&self, task: Task) {
        self.apply(|s| match s.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => s.tasks.push(task),
        });
    }

    pub fn remove_task(&self, id: TaskId) {
        self.apply(|s| s.tasks.retain(|t| t.id != id));
    }

    pub fn upsert_list(&self, list: List) {
        self.apply(|s| match s.lists.iter_mut().find(|l| l.id == list.id) {
            Some(slot) => *slot = list,
            None => s.lists.push(list),
        });
    }

    /// Remove a list and, mirroring the server-side cascade, every local
    /// task under it.
    pub fn remove_list(&self, id: ListId) {
        self.apply(|s| {
            s.lists.retain(|l| l.id != id);
            s.tasks.retain(|t| t.list_id != Some(id));
        });
    }

    /// Drop everything (logout).
    pub fn clear(&self) {
        let mut guard = self.current.write().expect("store lock poisoned");
        *guard = Arc::new(Snapshot::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskforge_shared::types::UserId;

    fn task(title: &str, list_id: Option<ListId>) -> Task {
        Task::new(UserId::new(), list_id, title)
    }

    #[test]
    fn snapshots_are_immutable() {
        let store = EntityStore::new();
        let before = store.snapshot();

        store.upsert_task(task("a", None));

        // The old snapshot is untouched; a new one sees the task.
        assert!(before.tasks.is_empty());
        assert_eq!(store.snapshot().tasks.len(), 1);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let store = EntityStore::new();
        let a = task("a", None);
        let b = task("b", None);
        store.upsert_task(a.clone());
        store.upsert_task(b.clone());

        let mut a2 = a.clone();
        a2.title = "a-renamed".into();
        store.upsert_task(a2);

        let snap = store.snapshot();
        assert_eq!(snap.tasks.len(), 2);
        // position preserved
        assert_eq!(snap.tasks[0].title, "a-renamed");
        assert_eq!(snap.tasks[1].id, b.id);
    }

    #[test]
    fn remove_list_drops_its_tasks() {
        let store = EntityStore::new();
        let owner = UserId::new();
        let list = List {
            id: ListId::new(),
            owner_id: owner,
            name: "L".into(),
            icon: String::new(),
            color: String::new(),
            default_view: Default::default(),
            shared_with: Vec::new(),
            created_at: chrono::Utc::now(),
        };
        store.upsert_list(list.clone());
        store.upsert_task(task("in-list", Some(list.id)));
        store.upsert_task(task("elsewhere", None));

        store.remove_list(list.id);

        let snap = store.snapshot();
        assert!(snap.lists.is_empty());
        assert_eq!(snap.tasks.len(), 1);
        assert_eq!(snap.tasks[0].title, "elsewhere");
    }

    #[test]
    fn clear_resets_everything() {
        let store = EntityStore::new();
        store.upsert_task(task("a", None));
        store.clear();
        let snap = store.snapshot();
        assert!(snap.tasks.is_empty() && snap.lists.is_empty() && snap.user.is_none());
    }
}
