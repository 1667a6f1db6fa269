mod from_row;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::Result;
use crate::feed::ChangeFeed;
use crate::report::{DocumentRenderer, TextRenderer};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub feed: ChangeFeed,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    /// State with the plain-text report renderer.
    pub fn new(db: DbPool, feed: ChangeFeed) -> Self {
        Self {
            db,
            feed,
            renderer: Arc::new(TextRenderer),
        }
    }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS api_keys (
    id TEXT PRIMARY KEY,
    profile_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    key_hash TEXT NOT NULL UNIQUE,
    created_at INTEGER NOT NULL,
    last_used_at INTEGER,
    revoked_at INTEGER
);
CREATE INDEX IF NOT EXISTS idx_api_keys_profile ON api_keys(profile_id);

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    short_description TEXT,
    problem_statement TEXT,
    solution_description TEXT,
    tech_stack TEXT NOT NULL DEFAULT '[]',
    github_url TEXT,
    deployed_url TEXT,
    download_url TEXT,
    qr_code_url TEXT,
    status TEXT NOT NULL DEFAULT 'in_progress'
        CHECK (status IN ('completed', 'in_progress', 'aborted')),
    created_by TEXT NOT NULL REFERENCES profiles(id),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_projects_created_by ON projects(created_by);

CREATE TABLE IF NOT EXISTS hackathons (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    short_description TEXT,
    problem_statement TEXT,
    solution_description TEXT,
    tech_stack TEXT NOT NULL DEFAULT '[]',
    github_url TEXT,
    deployed_url TEXT,
    download_url TEXT,
    qr_code_url TEXT,
    start_date TEXT,
    end_date TEXT,
    status TEXT NOT NULL DEFAULT 'upcoming'
        CHECK (status IN ('upcoming', 'ongoing', 'completed')),
    created_by TEXT NOT NULL REFERENCES profiles(id),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_hackathons_created_by ON hackathons(created_by);

CREATE TABLE IF NOT EXISTS project_members (
    id TEXT PRIMARY KEY,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    is_lead INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    UNIQUE (project_id, user_id)
);
CREATE INDEX IF NOT EXISTS idx_project_members_user ON project_members(user_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_project_members_one_lead
    ON project_members(project_id) WHERE role = 'Team Lead';

CREATE TABLE IF NOT EXISTS hackathon_members (
    id TEXT PRIMARY KEY,
    hackathon_id TEXT NOT NULL REFERENCES hackathons(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    is_lead INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    UNIQUE (hackathon_id, user_id)
);
CREATE INDEX IF NOT EXISTS idx_hackathon_members_user ON hackathon_members(user_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_hackathon_members_one_lead
    ON hackathon_members(hackathon_id) WHERE role = 'Team Lead';

CREATE TABLE IF NOT EXISTS hackathon_projects (
    id TEXT PRIMARY KEY,
    hackathon_id TEXT NOT NULL REFERENCES hackathons(id) ON DELETE CASCADE,
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    UNIQUE (hackathon_id, project_id)
);
"#;

pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// Per-connection setup. Memberships cascade through foreign keys, which
/// SQLite only enforces when asked to.
fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Open a pool on a database file and make sure the schema exists.
pub fn create_pool(path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path).with_init(configure_connection);
    let pool = Pool::builder().max_size(8).build(manager)?;
    init_db(&*pool.get()?)?;
    Ok(pool)
}
