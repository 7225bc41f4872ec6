//! Table schemas.
//!
//! - TEXT UUID primary keys
//! - Timestamps as fixed-width RFC 3339 TEXT (microseconds, UTC)
//! - JSON columns stored as TEXT
//! - Foreign keys RESTRICT on delete, CASCADE on update

/// Registered users. Email is unique.
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    email TEXT NOT NULL UNIQUE,
    name TEXT,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// Projects. The API key is unique and scopes sessions to the project.
pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    owner_id TEXT NOT NULL
        REFERENCES users(id) ON DELETE RESTRICT ON UPDATE CASCADE,
    api_key TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// Client visits. `project_id` is null for unscoped sessions.
pub const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT
        REFERENCES projects(id) ON DELETE RESTRICT ON UPDATE CASCADE,
    anonymous_id TEXT NOT NULL,
    user_id TEXT,
    metadata TEXT NOT NULL DEFAULT 'null',
    device TEXT NOT NULL DEFAULT 'unknown',
    browser TEXT NOT NULL DEFAULT 'unknown',
    os TEXT NOT NULL DEFAULT 'unknown',
    started_at TEXT NOT NULL
)
"#;

/// Interaction events. Append-only; rowid gives insertion order.
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY NOT NULL,
    session_id TEXT NOT NULL
        REFERENCES sessions(id) ON DELETE RESTRICT ON UPDATE CASCADE,
    type TEXT NOT NULL,
    element_id TEXT,
    x REAL,
    y REAL,
    scroll_offset REAL,
    properties TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
)
"#;

/// Generated reports. `data` is NULL when summarization yielded nothing.
pub const CREATE_REPORTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reports (
    id TEXT PRIMARY KEY NOT NULL,
    data TEXT,
    created_at TEXT NOT NULL
)
"#;

pub const CREATE_INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_events_session ON events(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_sessions_project ON sessions(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_reports_created ON reports(created_at)",
];

/// Returns every DDL statement in dependency order.
pub fn all_tables() -> Vec<&'static str> {
    let mut ddl = vec![
        CREATE_USERS_TABLE,
        CREATE_PROJECTS_TABLE,
        CREATE_SESSIONS_TABLE,
        CREATE_EVENTS_TABLE,
        CREATE_REPORTS_TABLE,
    ];
    ddl.extend(CREATE_INDEXES);
    ddl
}
