//! Derived views over the task set.
//!
//! Resolution is a pure function of `(tasks, active view, query, sort
//! key, today)`: scope filter, then search filter, then sort. The kanban
//! board is an alternate grouping of the same filtered/sorted sequence.
//! Nothing here mutates the store or performs I/O.

use chrono::NaiveDate;

use taskforge_shared::constants::{VIEW_IMPORTANT, VIEW_PLANNED, VIEW_TODAY};
use taskforge_shared::model::Task;
use taskforge_shared::types::{ListId, TaskStatus};

/// What the user is currently looking at: one of the three virtual
/// lists, or a concrete list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    Important,
    Planned,
    Today,
    List(ListId),
}

impl ActiveView {
    /// Parse a view identifier: a virtual-list name or a list id.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            VIEW_IMPORTANT => Some(ActiveView::Important),
            VIEW_PLANNED => Some(ActiveView::Planned),
            VIEW_TODAY => Some(ActiveView::Today),
            other => other.parse().ok().map(|id| ActiveView::List(ListId(id))),
        }
    }

    pub fn is_virtual(&self) -> bool {
        !matches!(self, ActiveView::List(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Newest first by creation time.
    #[default]
    DateDesc,
    /// High before medium before low; ties keep their input order.
    Priority,
    /// Case-sensitive lexicographic ascending on title.
    Alphabetical,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "date_desc" => Some(SortKey::DateDesc),
            "priority" => Some(SortKey::Priority),
            "alphabetical" => Some(SortKey::Alphabetical),
            _ => None,
        }
    }
}

fn in_scope(task: &Task, view: &ActiveView, today: NaiveDate) -> bool {
    match view {
        ActiveView::Important => task.important,
        ActiveView::Planned => task.due_date.is_some(),
        ActiveView::Today => task.due_date == Some(today),
        // A task with no list belongs to every concrete list. Permissive
        // on purpose; see the behaviour test below.
        ActiveView::List(id) => match task.list_id {
            Some(list_id) => list_id == *id,
            None => true,
        },
    }
}

fn matches_query(task: &Task, query_lower: &str) -> bool {
    if query_lower.is_empty() {
        return true;
    }
    task.title.to_lowercase().contains(query_lower)
        || task.note.to_lowercase().contains(query_lower)
}

/// Produce the ordered sequence of tasks to render.
pub fn resolve(
    tasks: &[Task],
    view: &ActiveView,
    query: &str,
    sort: SortKey,
    today: NaiveDate,
) -> Vec<Task> {
    let query_lower = query.to_lowercase();

    let mut out: Vec<Task> = tasks
        .iter()
        .filter(|t| in_scope(t, view, today) && matches_query(t, &query_lower))
        .cloned()
        .collect();

    // Vec::sort_by is stable, which the priority tie rule depends on.
    match sort {
        SortKey::DateDesc => out.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Priority => out.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank())),
        SortKey::Alphabetical => out.sort_by(|a, b| a.title.cmp(&b.title)),
    }

    out
}

/// The three kanban columns. Always a total, disjoint cover of the
/// input.
#[derive(Debug, Clone, Default)]
pub struct KanbanBoard {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub done: Vec<Task>,
}

impl KanbanBoard {
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition an already filtered/sorted sequence by status.
pub fn kanban(tasks: &[Task]) -> KanbanBoard {
    let mut board = KanbanBoard::default();
    for task in tasks {
        match task.status {
            TaskStatus::Todo => board.todo.push(task.clone()),
            TaskStatus::InProgress => board.in_progress.push(task.clone()),
            TaskStatus::Done => board.done.push(task.clone()),
        }
    }
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use taskforge_shared::types::{Priority, UserId};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
    }

    fn task(title: &str) -> Task {
        Task::new(UserId::new(), None, title)
    }

    #[test]
    fn important_view_spans_all_lists() {
        let l1 = ListId::new();
        let l2 = ListId::new();
        let mut a = task("A");
        a.important = true;
        a.list_id = Some(l1);
        let mut b = task("B");
        b.list_id = Some(l2);

        let tasks = vec![a.clone(), b];
        let out = resolve(
            &tasks,
            &ActiveView::Important,
            "",
            SortKey::DateDesc,
            today(),
        );
        assert_eq!(out.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a.id]);
    }

    #[test]
    fn planned_requires_a_due_date_today_requires_todays() {
        let mut due_today = task("due today");
        due_today.due_date = Some(today());
        let mut due_later = task("due later");
        due_later.due_date = Some(today() + Duration::days(3));
        let undated = task("undated");

        let tasks = vec![due_today.clone(), due_later.clone(), undated];

        let planned = resolve(&tasks, &ActiveView::Planned, "", SortKey::Alphabetical, today());
        assert_eq!(planned.len(), 2);

        let today_view = resolve(&tasks, &ActiveView::Today, "", SortKey::Alphabetical, today());
        assert_eq!(today_view.iter().map(|t| t.id).collect::<Vec<_>>(), vec![due_today.id]);
    }

    #[test]
    fn task_without_list_is_visible_in_every_concrete_list() {
        // Documented permissive default, not silently tightened.
        let l1 = ListId::new();
        let l2 = ListId::new();
        let mut homed = task("homed");
        homed.list_id = Some(l1);
        let floating = task("floating");

        let tasks = vec![homed.clone(), floating.clone()];

        let in_l1 = resolve(&tasks, &ActiveView::List(l1), "", SortKey::Alphabetical, today());
        assert_eq!(in_l1.len(), 2);

        let in_l2 = resolve(&tasks, &ActiveView::List(l2), "", SortKey::Alphabetical, today());
        assert_eq!(in_l2.iter().map(|t| t.id).collect::<Vec<_>>(), vec![floating.id]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_note() {
        let mut by_title = task("Write REPORT");
        by_title.note = String::new();
        let mut by_note = task("misc");
        by_note.note = "report appendix".into();
        let neither = task("groceries");

        let tasks = vec![by_title, by_note, neither];
        let out = resolve(&tasks, &ActiveView::List(ListId::new()), "report", SortKey::DateDesc, today());
        assert_eq!(out.len(), 2);

        let all = resolve(&tasks, &ActiveView::List(ListId::new()), "", SortKey::DateDesc, today());
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn priority_sort_is_stable_for_ties() {
        let t0 = Utc::now();
        let mut x = task("X");
        x.priority = Priority::Low;
        x.created_at = t0;
        let mut y = task("Y");
        y.priority = Priority::High;
        y.created_at = t0 + Duration::seconds(1);
        let mut z = task("Z");
        z.priority = Priority::Low;
        z.created_at = t0 + Duration::seconds(2);

        let tasks = vec![x.clone(), y.clone(), z.clone()];
        let out = resolve(&tasks, &ActiveView::List(ListId::new()), "", SortKey::Priority, today());
        assert_eq!(
            out.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![y.id, x.id, z.id]
        );
    }

    #[test]
    fn date_desc_is_newest_first() {
        let t0 = Utc::now();
        let mut old = task("old");
        old.created_at = t0;
        let mut new = task("new");
        new.created_at = t0 + Duration::seconds(5);

        let out = resolve(
            &[old.clone(), new.clone()],
            &ActiveView::List(ListId::new()),
            "",
            SortKey::DateDesc,
            today(),
        );
        assert_eq!(out[0].id, new.id);
    }

    #[test]
    fn alphabetical_is_case_sensitive_ascending() {
        let tasks = vec![task("banana"), task("Apple"), task("apple")];
        let out = resolve(&tasks, &ActiveView::List(ListId::new()), "", SortKey::Alphabetical, today());
        let titles: Vec<_> = out.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Apple", "apple", "banana"]);
    }

    #[test]
    fn resolution_is_idempotent() {
        let mut a = task("a");
        a.important = true;
        let tasks = vec![a, task("b"), task("c")];

        let first = resolve(&tasks, &ActiveView::Important, "", SortKey::Priority, today());
        let second = resolve(&tasks, &ActiveView::Important, "", SortKey::Priority, today());
        assert_eq!(first, second);
    }

    #[test]
    fn kanban_is_a_disjoint_total_cover() {
        let mut in_progress = task("doing");
        in_progress.status = TaskStatus::InProgress;
        let mut done = task("done");
        done.status = TaskStatus::Done;
        // Default status lands in todo.
        let fresh = task("fresh");

        let tasks = vec![in_progress.clone(), done.clone(), fresh.clone()];
        let board = kanban(&tasks);

        assert_eq!(board.len(), tasks.len());
        assert_eq!(board.todo.iter().map(|t| t.id).collect::<Vec<_>>(), vec![fresh.id]);
        assert_eq!(board.in_progress.len(), 1);
        assert_eq!(board.done.len(), 1);

        // No task appears in two columns.
        let mut seen = std::collections::HashSet::new();
        for status in TaskStatus::ALL {
            for t in board.column(status) {
                assert!(seen.insert(t.id));
            }
        }
    }

    #[test]
    fn active_view_parses_virtual_names_and_ids() {
        assert_eq!(ActiveView::parse("important"), Some(ActiveView::Important));
        assert_eq!(ActiveView::parse("planned"), Some(ActiveView::Planned));
        assert_eq!(ActiveView::parse("today"), Some(ActiveView::Today));

        let id = ListId::new();
        assert_eq!(ActiveView::parse(&id.to_string()), Some(ActiveView::List(id)));
        assert_eq!(ActiveView::parse("not-a-view"), None);
    }
}
