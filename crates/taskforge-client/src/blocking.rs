//! Blocking evaluator.
//!
//! A task is blocked while any of its `blocked_by` references resolves
//! to an existing, incomplete task. A reference that resolves to nothing
//! (the blocker was deleted) never blocks: fail-open. Only direct
//! references are inspected; transitive blocking is out of scope, which
//! also means reference cycles cannot cause unbounded evaluation.

use taskforge_shared::model::Task;

/// Whether `task` may not currently be marked complete.
pub fn is_blocked(task: &Task, all_tasks: &[Task]) -> bool {
    if task.blocked_by.is_empty() {
        return false;
    }
    task.blocked_by.iter().any(|blocker_id| {
        all_tasks
            .iter()
            .find(|t| t.id == *blocker_id)
            .is_some_and(|blocker| !blocker.completed)
    })
}
