//! v001 -- Initial schema creation.
//!
//! Creates the four core tables: `users`, `sessions`, `lists`, `tasks`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    provider_id  TEXT NOT NULL UNIQUE,        -- identity-provider subject
    email        TEXT NOT NULL,
    name         TEXT NOT NULL,
    picture      TEXT NOT NULL DEFAULT '',
    xp           INTEGER NOT NULL DEFAULT 0,
    level        INTEGER NOT NULL DEFAULT 1,
    daily_streak INTEGER NOT NULL DEFAULT 0,
    badges       TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    created_at   TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Sessions (opaque bearer tokens)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY NOT NULL,
    user_id    TEXT NOT NULL,                 -- FK -> users(id)
    expires_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Lists
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS lists (
    id           TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    owner_id     TEXT NOT NULL,               -- FK -> users(id)
    name         TEXT NOT NULL,
    icon         TEXT NOT NULL DEFAULT 'List',
    color        TEXT NOT NULL DEFAULT '',
    default_view TEXT NOT NULL DEFAULT 'list',
    shared_with  TEXT NOT NULL DEFAULT '[]',  -- JSON array of user ids
    created_at   TEXT NOT NULL,

    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_lists_owner ON lists(owner_id);

-- ----------------------------------------------------------------
-- Tasks
-- ----------------------------------------------------------------
-- list_id carries no foreign key: a task without a list is legal, and
-- blocked_by/subtasks live in JSON columns rather than join tables.
CREATE TABLE IF NOT EXISTS tasks (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    owner_id    TEXT NOT NULL,                -- FK -> users(id)
    list_id     TEXT,                         -- nullable reference to lists(id)
    title       TEXT NOT NULL,
    note        TEXT NOT NULL DEFAULT '',
    completed   INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    important   INTEGER NOT NULL DEFAULT 0,
    priority    TEXT NOT NULL DEFAULT 'low',
    due_date    TEXT,                         -- ISO-8601 date
    due_time    TEXT,
    tags        TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    recurrence  TEXT NOT NULL DEFAULT 'none',
    status      TEXT NOT NULL DEFAULT 'todo',
    time_spent  INTEGER NOT NULL DEFAULT 0,   -- seconds
    blocked_by  TEXT NOT NULL DEFAULT '[]',   -- JSON array of task ids
    subtasks    TEXT NOT NULL DEFAULT '[]',   -- JSON array of subtask objects
    attachments TEXT NOT NULL DEFAULT '[]',   -- JSON array of attachment objects
    location    TEXT,                         -- JSON object
    created_at  TEXT NOT NULL,

    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id);
CREATE INDEX IF NOT EXISTS idx_tasks_owner_list ON tasks(owner_id, list_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
