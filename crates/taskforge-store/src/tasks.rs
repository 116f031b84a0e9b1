use chrono::{NaiveDate, Utc};
use rusqlite::params;

use taskforge_shared::model::Task;
use taskforge_shared::protocol::{NewTask, TaskPatch};
use taskforge_shared::types::{ListId, Priority, Recurrence, TaskId, TaskStatus, UserId};

use crate::database::Database;
use crate::error::Result;
use crate::users::{not_found, parse_json, parse_timestamp, parse_uuid};

impl Database {
    pub fn create_task(&self, owner_id: UserId, new: &NewTask) -> Result<Task> {
        let task = Task {
            id: TaskId::new(),
            owner_id,
            list_id: new.list_id,
            title: new.title.clone(),
            note: new.note.clone().unwrap_or_default(),
            completed: false,
            important: new.important.unwrap_or(false),
            priority: new.priority.unwrap_or_default(),
            due_date: new.due_date,
            due_time: new.due_time.clone(),
            tags: new.tags.clone().unwrap_or_default(),
            recurrence: new.recurrence.unwrap_or_default(),
            status: new.status.unwrap_or_default(),
            time_spent: 0,
            blocked_by: new.blocked_by.clone().unwrap_or_default(),
            subtasks: new.subtasks.clone().unwrap_or_default(),
            attachments: new.attachments.clone().unwrap_or_default(),
            location: new.location.clone(),
            created_at: Utc::now(),
        };
        self.insert_task(&task)?;
        Ok(task)
    }

    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.conn().execute(
            "INSERT INTO tasks (id, owner_id, list_id, title, note, completed, important,
                                priority, due_date, due_time, tags, recurrence, status,
                                time_spent, blocked_by, subtasks, attachments, location, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            params![
                task.id.to_string(),
                task.owner_id.to_string(),
                task.list_id.map(|id| id.to_string()),
                task.title,
                task.note,
                task.completed,
                task.important,
                priority_to_str(task.priority),
                task.due_date.map(|d| d.to_string()),
                task.due_time,
                serde_json::to_string(&task.tags)?,
                recurrence_to_str(task.recurrence),
                status_to_str(task.status),
                task.time_spent,
                serde_json::to_string(&task.blocked_by)?,
                serde_json::to_string(&task.subtasks)?,
                serde_json::to_string(&task.attachments)?,
                task.location
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                task.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, owner_id: UserId, id: TaskId) -> Result<Task> {
        self.conn()
            .query_row(
                &format!("{SELECT_TASK} WHERE id = ?1 AND owner_id = ?2"),
                params![id.to_string(), owner_id.to_string()],
                row_to_task,
            )
            .map_err(not_found)
    }

    /// All tasks owned by `owner_id`, oldest first.
    pub fn get_tasks(&self, owner_id: UserId) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{SELECT_TASK} WHERE owner_id = ?1 ORDER BY created_at ASC"))?;
        let rows = stmt.query_map(params![owner_id.to_string()], row_to_task)?;
        collect(rows)
    }

    /// Tasks under one concrete list.
    pub fn get_tasks_for_list(&self, owner_id: UserId, list_id: ListId) -> Result<Vec<Task>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SELECT_TASK} WHERE owner_id = ?1 AND list_id = ?2 ORDER BY created_at ASC"
        ))?;
        let rows = stmt.query_map(params![owner_id.to_string(), list_id.to_string()], row_to_task)?;
        collect(rows)
    }

    /// Apply a partial update and return the stored task.
    ///
    /// The whole row is rewritten from the merged value; fields absent
    /// from the patch keep their stored value.
    pub fn update_task(&self, owner_id: UserId, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        let mut task = self.get_task(owner_id, id)?;
        apply_patch(&mut task, patch);

        self.conn().execute(
            "UPDATE tasks SET list_id = ?3, title = ?4, note = ?5, completed = ?6,
                              important = ?7, priority = ?8, due_date = ?9, due_time = ?10,
                              tags = ?11, recurrence = ?12, status = ?13, time_spent = ?14,
                              blocked_by = ?15, subtasks = ?16, attachments = ?17, location = ?18
             WHERE id = ?1 AND owner_id = ?2",
            params![
                id.to_string(),
                owner_id.to_string(),
                task.list_id.map(|id| id.to_string()),
                task.title,
                task.note,
                task.completed,
                task.important,
                priority_to_str(task.priority),
                task.due_date.map(|d| d.to_string()),
                task.due_time,
                serde_json::to_string(&task.tags)?,
                recurrence_to_str(task.recurrence),
                status_to_str(task.status),
                task.time_spent,
                serde_json::to_string(&task.blocked_by)?,
                serde_json::to_string(&task.subtasks)?,
                serde_json::to_string(&task.attachments)?,
                task.location
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
            ],
        )?;

        Ok(task)
    }

    /// Delete a task. Other tasks referencing it in `blocked_by` keep the
    /// stale id; the blocking evaluator treats those as non-blocking.
    pub fn delete_task(&self, owner_id: UserId, id: TaskId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
            params![id.to_string(), owner_id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

fn apply_patch(task: &mut Task, patch: &TaskPatch) {
    if let Some(list_id) = patch.list_id {
        task.list_id = Some(list_id);
    }
    if let Some(ref title) = patch.title {
        task.title = title.clone();
    }
    if let Some(ref note) = patch.note {
        task.note = note.clone();
    }
    if let Some(completed) = patch.completed {
        task.completed = completed;
    }
    if let Some(important) = patch.important {
        task.important = important;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = Some(due_date);
    }
    if let Some(ref due_time) = patch.due_time {
        task.due_time = Some(due_time.clone());
    }
    if let Some(ref tags) = patch.tags {
        task.tags = tags.clone();
    }
    if let Some(recurrence) = patch.recurrence {
        task.recurrence = recurrence;
    }
    if let Some(status) = patch.status {
        task.status = status;
    }
    if let Some(time_spent) = patch.time_spent {
        task.time_spent = time_spent;
    }
    if let Some(ref blocked_by) = patch.blocked_by {
        task.blocked_by = blocked_by.clone();
    }
    if let Some(ref subtasks) = patch.subtasks {
        task.subtasks = subtasks.clone();
    }
    if let Some(ref attachments) = patch.attachments {
        task.attachments = attachments.clone();
    }
    if let Some(ref location) = patch.location {
        task.location = Some(location.clone());
    }
}

const SELECT_TASK: &str = "SELECT id, owner_id, list_id, title, note, completed, important,
                                  priority, due_date, due_time, tags, recurrence, status,
                                  time_spent, blocked_by, subtasks, attachments, location, created_at
                           FROM tasks";

fn collect(rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<Task>>) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row?);
    }
    Ok(tasks)
}

fn priority_to_str(p: Priority) -> &'static str {
    match p {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    }
}

fn recurrence_to_str(r: Recurrence) -> &'static str {
    match r {
        Recurrence::None => "none",
        Recurrence::Daily => "daily",
        Recurrence::Weekly => "weekly",
        Recurrence::Monthly => "monthly",
        Recurrence::Yearly => "yearly",
    }
}

fn status_to_str(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Todo => "todo",
        TaskStatus::InProgress => "in_progress",
        TaskStatus::Done => "done",
    }
}

fn conversion_err(index: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, msg.into())
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let id_str: String = row.get(0)?;
    let owner_str: String = row.get(1)?;
    let list_str: Option<String> = row.get(2)?;
    let priority_str: String = row.get(7)?;
    let due_str: Option<String> = row.get(8)?;
    let tags_str: String = row.get(10)?;
    let recurrence_str: String = row.get(11)?;
    let status_str: String = row.get(12)?;
    let blocked_str: String = row.get(14)?;
    let subtasks_str: String = row.get(15)?;
    let attachments_str: String = row.get(16)?;
    let location_str: Option<String> = row.get(17)?;
    let ts_str: String = row.get(18)?;

    let list_id = match list_str {
        Some(s) => Some(ListId(parse_uuid(2, &s)?)),
        None => None,
    };
    let priority = match priority_str.as_str() {
        "low" => Priority::Low,
        "medium" => Priority::Medium,
        "high" => Priority::High,
        other => return Err(conversion_err(7, format!("unknown priority: {other}"))),
    };
    let due_date = match due_str {
        Some(s) => Some(
            s.parse::<NaiveDate>()
                .map_err(|e| conversion_err(8, e.to_string()))?,
        ),
        None => None,
    };
    let recurrence = match recurrence_str.as_str() {
        "none" => Recurrence::None,
        "daily" => Recurrence::Daily,
        "weekly" => Recurrence::Weekly,
        "monthly" => Recurrence::Monthly,
        "yearly" => Recurrence::Yearly,
        other => return Err(conversion_err(11, format!("unknown recurrence: {other}"))),
    };
    let status = match status_str.as_str() {
        "todo" => TaskStatus::Todo,
        "in_progress" => TaskStatus::InProgress,
        "done" => TaskStatus::Done,
        other => return Err(conversion_err(12, format!("unknown status: {other}"))),
    };
    let location = match location_str {
        Some(s) => Some(parse_json(17, &s)?),
        None => None,
    };

    Ok(Task {
        id: TaskId(parse_uuid(0, &id_str)?),
        owner_id: UserId(parse_uuid(1, &owner_str)?),
        list_id,
        title: row.get(3)?,
        note: row.get(4)?,
        completed: row.get(5)?,
        important: row.get(6)?,
        priority,
        due_date,
        due_time: row.get(9)?,
        tags: parse_json(10, &tags_str)?,
        recurrence,
        status,
        time_spent: row.get(13)?,
        blocked_by: parse_json(14, &blocked_str)?,
        subtasks: parse_json(15, &subtasks_str)?,
        attachments: parse_json(16, &attachments_str)?,
        location,
        created_at: parse_timestamp(18, &ts_str)?,
    })
}
