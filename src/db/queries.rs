use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, params, params_from_iter, types::Value};
use uuid::Uuid;

use crate::error::{AppError, Result, conflict_on_unique};
use crate::models::*;
use crate::util::{generate_api_key, hash_secret};

use super::from_row::{
    HACKATHON_COLS, HACKATHON_PROJECT_COLS, PROFILE_COLS, PROJECT_COLS, membership_cols,
    query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

fn tech_stack_json(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).map_err(|e| AppError::Internal(e.to_string()))
}

fn date_value(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

/// Outcome of a write that may be silently filtered by its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing to write
    Unchanged,
    Applied,
    /// The statement ran but its WHERE clause matched no row
    NoRowsAffected,
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query, optionally restricted
/// by an extra scope condition.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    scope: Option<(String, Vec<Value>)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            scope: None,
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    /// Use this for Option<T> where Some(v) = set to v, None = set to NULL.
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    /// Only touch the row when `condition` also holds.
    fn scope(mut self, condition: String, values: Vec<Value>) -> Self {
        self.scope = Some((condition, values));
        self
    }

    fn execute(mut self, conn: &Connection) -> Result<WriteOutcome> {
        if self.fields.is_empty() {
            return Ok(WriteOutcome::Unchanged);
        }
        self.fields.push(("updated_at", now().into()));

        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());

        let mut sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        if let Some((condition, scope_values)) = self.scope {
            sql.push_str(&format!(" AND ({})", condition));
            values.extend(scope_values);
        }

        let affected = conn.execute(&sql, params_from_iter(values))?;
        Ok(if affected > 0 {
            WriteOutcome::Applied
        } else {
            WriteOutcome::NoRowsAffected
        })
    }
}

/// Write scope for entity updates: members of the entity. Creators who are
/// not on the roster fall back to `creator_scope`.
fn member_scope(kind: EntityKind, user_id: &str) -> (String, Vec<Value>) {
    (
        format!(
            "id IN (SELECT {} FROM {} WHERE user_id = ?)",
            kind.fk_column(),
            kind.member_table()
        ),
        vec![user_id.to_string().into()],
    )
}

fn creator_scope(user_id: &str) -> (String, Vec<Value>) {
    ("created_by = ?".to_string(), vec![user_id.to_string().into()])
}

// ============ Profiles ============

pub fn create_profile(conn: &Connection, input: &CreateProfile) -> Result<Profile> {
    let id = gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();
    let full_name = input.full_name.trim().to_string();

    conn.execute(
        "INSERT INTO profiles (id, email, full_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, &email, &full_name, now, now],
    )
    .map_err(|e| conflict_on_unique(e, "Email already exists"))?;

    Ok(Profile {
        id,
        email,
        full_name,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_profile_by_id(conn: &Connection, id: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLS),
        [id],
    )
}

pub fn list_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    query_all(
        conn,
        &format!("SELECT {} FROM profiles ORDER BY full_name, email", PROFILE_COLS),
        [],
    )
}

/// Fetch the profiles for a set of ids. Unknown ids are skipped.
pub fn get_profiles_by_ids(conn: &Connection, ids: &[&str]) -> Result<Vec<Profile>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    query_all(
        conn,
        &format!(
            "SELECT {} FROM profiles WHERE id IN ({})",
            PROFILE_COLS, placeholders
        ),
        params_from_iter(ids.iter()),
    )
}

// ============ API Keys ============

/// Issue a new API key for a profile. Returns the plaintext key; only its
/// hash is stored.
pub fn create_api_key(conn: &Connection, profile_id: &str) -> Result<String> {
    let key = generate_api_key();
    conn.execute(
        "INSERT INTO api_keys (id, profile_id, key_hash, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![gen_id(), profile_id, hash_secret(&key), now()],
    )?;
    Ok(key)
}

/// Resolve an API key to its profile. Revoked keys resolve to nothing.
pub fn get_profile_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<Profile>> {
    let key_hash = hash_secret(api_key);
    let profile: Option<Profile> = query_one(
        conn,
        "SELECT p.id, p.email, p.full_name, p.created_at, p.updated_at
         FROM api_keys k
         JOIN profiles p ON p.id = k.profile_id
         WHERE k.key_hash = ?1 AND k.revoked_at IS NULL",
        [&key_hash],
    )?;

    if profile.is_some() {
        conn.execute(
            "UPDATE api_keys SET last_used_at = ?1 WHERE key_hash = ?2",
            params![now(), &key_hash],
        )?;
    }

    Ok(profile)
}

/// Whether a key still authenticates. Unlike the lookup, leaves `last_used_at` alone.
pub fn is_api_key_active(conn: &Connection, api_key: &str) -> Result<bool> {
    let active = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM api_keys WHERE key_hash = ?1 AND revoked_at IS NULL)",
        [hash_secret(api_key)],
        |row| row.get(0),
    )?;
    Ok(active)
}

pub fn revoke_api_key(conn: &Connection, api_key: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE api_keys SET revoked_at = ?1 WHERE key_hash = ?2 AND revoked_at IS NULL",
        params![now(), hash_secret(api_key)],
    )?;
    Ok(affected > 0)
}

// ============ Projects ============

pub fn create_project(conn: &Connection, created_by: &str, input: &CreateProject) -> Result<Project> {
    let id = gen_id();
    let now = now();
    let tech_stack = input.tech_stack.normalize();

    conn.execute(
        "INSERT INTO projects (id, title, short_description, problem_statement, solution_description, tech_stack, github_url, deployed_url, download_url, qr_code_url, status, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            &id,
            input.title.trim(),
            &input.short_description,
            &input.problem_statement,
            &input.solution_description,
            tech_stack_json(&tech_stack)?,
            &input.github_url,
            &input.deployed_url,
            &input.download_url,
            &input.qr_code_url,
            input.status.as_ref(),
            created_by,
            now,
            now
        ],
    )?;

    Ok(Project {
        id,
        title: input.title.trim().to_string(),
        short_description: input.short_description.clone(),
        problem_statement: input.problem_statement.clone(),
        solution_description: input.solution_description.clone(),
        tech_stack,
        github_url: input.github_url.clone(),
        deployed_url: input.deployed_url.clone(),
        download_url: input.download_url.clone(),
        qr_code_url: input.qr_code_url.clone(),
        status: input.status,
        created_by: created_by.to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_project_by_id(conn: &Connection, id: &str) -> Result<Option<Project>> {
    query_one(
        conn,
        &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLS),
        [id],
    )
}

pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM projects ORDER BY created_at DESC, rowid DESC",
            PROJECT_COLS
        ),
        [],
    )
}

fn project_update(id: &str, input: &UpdateProject) -> Result<UpdateBuilder> {
    // None = leave unchanged, Some(None) = clear, Some(Some(v)) = set
    let mut builder = UpdateBuilder::new("projects", id)
        .set_opt("title", input.title.as_ref().map(|t| t.trim().to_string()))
        .set_opt("status", input.status.map(|s| s.as_ref().to_string()));

    if let Some(ref tech_stack) = input.tech_stack {
        builder = builder.set("tech_stack", tech_stack_json(&tech_stack.normalize())?);
    }

    for (column, value) in [
        ("short_description", &input.short_description),
        ("problem_statement", &input.problem_statement),
        ("solution_description", &input.solution_description),
        ("github_url", &input.github_url),
        ("deployed_url", &input.deployed_url),
        ("download_url", &input.download_url),
        ("qr_code_url", &input.qr_code_url),
    ] {
        if let Some(value) = value {
            builder = builder.set_nullable(column, value.clone());
        }
    }

    Ok(builder)
}

/// Update a project on behalf of `user_id`, limited to projects they are a
/// member of.
pub fn update_project(
    conn: &Connection,
    id: &str,
    user_id: &str,
    input: &UpdateProject,
) -> Result<WriteOutcome> {
    let (condition, values) = member_scope(EntityKind::Project, user_id);
    project_update(id, input)?.scope(condition, values).execute(conn)
}

/// Creator-only write, used when the member-scoped write matched nothing.
pub fn update_project_as_creator(
    conn: &Connection,
    id: &str,
    user_id: &str,
    input: &UpdateProject,
) -> Result<WriteOutcome> {
    let (condition, values) = creator_scope(user_id);
    project_update(id, input)?.scope(condition, values).execute(conn)
}

pub fn delete_project(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ Hackathons ============

pub fn create_hackathon(
    conn: &Connection,
    created_by: &str,
    input: &CreateHackathon,
) -> Result<Hackathon> {
    let id = gen_id();
    let now = now();
    let tech_stack = input.tech_stack.normalize();

    conn.execute(
        "INSERT INTO hackathons (id, title, short_description, problem_statement, solution_description, tech_stack, github_url, deployed_url, download_url, qr_code_url, start_date, end_date, status, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            &id,
            input.title.trim(),
            &input.short_description,
            &input.problem_statement,
            &input.solution_description,
            tech_stack_json(&tech_stack)?,
            &input.github_url,
            &input.deployed_url,
            &input.download_url,
            &input.qr_code_url,
            date_value(input.start_date),
            date_value(input.end_date),
            input.status.as_ref(),
            created_by,
            now,
            now
        ],
    )?;

    Ok(Hackathon {
        id,
        title: input.title.trim().to_string(),
        short_description: input.short_description.clone(),
        problem_statement: input.problem_statement.clone(),
        solution_description: input.solution_description.clone(),
        tech_stack,
        github_url: input.github_url.clone(),
        deployed_url: input.deployed_url.clone(),
        download_url: input.download_url.clone(),
        qr_code_url: input.qr_code_url.clone(),
        start_date: input.start_date,
        end_date: input.end_date,
        status: input.status,
        created_by: created_by.to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_hackathon_by_id(conn: &Connection, id: &str) -> Result<Option<Hackathon>> {
    query_one(
        conn,
        &format!("SELECT {} FROM hackathons WHERE id = ?1", HACKATHON_COLS),
        [id],
    )
}

/// Newest start date first; undated hackathons last.
pub fn list_hackathons(conn: &Connection) -> Result<Vec<Hackathon>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM hackathons ORDER BY start_date DESC, created_at DESC, rowid DESC",
            HACKATHON_COLS
        ),
        [],
    )
}

fn hackathon_update(id: &str, input: &UpdateHackathon) -> Result<UpdateBuilder> {
    let mut builder = UpdateBuilder::new("hackathons", id)
        .set_opt("title", input.title.as_ref().map(|t| t.trim().to_string()))
        .set_opt("status", input.status.map(|s| s.as_ref().to_string()));

    if let Some(ref tech_stack) = input.tech_stack {
        builder = builder.set("tech_stack", tech_stack_json(&tech_stack.normalize())?);
    }
    if let Some(start_date) = input.start_date {
        builder = builder.set_nullable("start_date", date_value(start_date));
    }
    if let Some(end_date) = input.end_date {
        builder = builder.set_nullable("end_date", date_value(end_date));
    }

    for (column, value) in [
        ("short_description", &input.short_description),
        ("problem_statement", &input.problem_statement),
        ("solution_description", &input.solution_description),
        ("github_url", &input.github_url),
        ("deployed_url", &input.deployed_url),
        ("download_url", &input.download_url),
        ("qr_code_url", &input.qr_code_url),
    ] {
        if let Some(value) = value {
            builder = builder.set_nullable(column, value.clone());
        }
    }

    Ok(builder)
}

/// Update a hackathon on behalf of `user_id`, limited to hackathons they are
/// a member of.
pub fn update_hackathon(
    conn: &Connection,
    id: &str,
    user_id: &str,
    input: &UpdateHackathon,
) -> Result<WriteOutcome> {
    let (condition, values) = member_scope(EntityKind::Hackathon, user_id);
    hackathon_update(id, input)?.scope(condition, values).execute(conn)
}

pub fn update_hackathon_as_creator(
    conn: &Connection,
    id: &str,
    user_id: &str,
    input: &UpdateHackathon,
) -> Result<WriteOutcome> {
    let (condition, values) = creator_scope(user_id);
    hackathon_update(id, input)?.scope(condition, values).execute(conn)
}

pub fn delete_hackathon(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM hackathons WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

// ============ Hackathon Projects ============

pub fn link_hackathon_project(
    conn: &Connection,
    hackathon_id: &str,
    project_id: &str,
) -> Result<HackathonProject> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO hackathon_projects (id, hackathon_id, project_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![&id, hackathon_id, project_id, now],
    )
    .map_err(|e| conflict_on_unique(e, "Project is already linked to this hackathon"))?;

    Ok(HackathonProject {
        id,
        hackathon_id: hackathon_id.to_string(),
        project_id: project_id.to_string(),
        created_at: now,
    })
}

pub fn list_hackathon_projects(conn: &Connection, hackathon_id: &str) -> Result<Vec<HackathonProject>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM hackathon_projects WHERE hackathon_id = ?1 ORDER BY rowid",
            HACKATHON_PROJECT_COLS
        ),
        [hackathon_id],
    )
}

pub fn unlink_hackathon_project(
    conn: &Connection,
    hackathon_id: &str,
    project_id: &str,
) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM hackathon_projects WHERE hackathon_id = ?1 AND project_id = ?2",
        params![hackathon_id, project_id],
    )?;
    Ok(deleted > 0)
}

// ============ Memberships ============

/// Creator of an entity, or None if it doesn't exist.
pub fn get_entity_creator(conn: &Connection, kind: EntityKind, id: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT created_by FROM {} WHERE id = ?1",
        kind.entity_table()
    ))?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// One entity's roster in insertion order.
pub fn list_memberships(conn: &Connection, kind: EntityKind, entity_id: &str) -> Result<Vec<Membership>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY rowid",
            membership_cols(kind),
            kind.member_table(),
            kind.fk_column()
        ),
        [entity_id],
    )
}

pub fn list_all_memberships(conn: &Connection, kind: EntityKind) -> Result<Vec<Membership>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM {} ORDER BY rowid",
            membership_cols(kind),
            kind.member_table()
        ),
        [],
    )
}

pub fn list_memberships_for_user(
    conn: &Connection,
    kind: EntityKind,
    user_id: &str,
) -> Result<Vec<Membership>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM {} WHERE user_id = ?1 ORDER BY rowid",
            membership_cols(kind),
            kind.member_table()
        ),
        [user_id],
    )
}

/// Persist a membership already accepted by the roster.
pub fn insert_membership(conn: &Connection, kind: EntityKind, member: &Membership) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (id, {}, user_id, role, is_lead, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            kind.member_table(),
            kind.fk_column()
        ),
        params![
            &member.id,
            &member.entity_id,
            &member.user_id,
            member.role.as_ref(),
            member.is_lead,
            member.created_at
        ],
    )
    .map_err(|e| {
        conflict_on_unique(
            e,
            "Membership conflicts with the current team; refresh and try again",
        )
    })?;
    Ok(())
}

pub fn update_membership_role(
    conn: &Connection,
    kind: EntityKind,
    entity_id: &str,
    member_id: &str,
    role: TeamRole,
) -> Result<bool> {
    let affected = conn
        .execute(
            &format!(
                "UPDATE {} SET role = ?1, is_lead = ?2 WHERE id = ?3 AND {} = ?4",
                kind.member_table(),
                kind.fk_column()
            ),
            params![role.as_ref(), role.is_lead(), member_id, entity_id],
        )
        .map_err(|e| {
            conflict_on_unique(
                e,
                "Membership conflicts with the current team; refresh and try again",
            )
        })?;
    Ok(affected > 0)
}

pub fn delete_membership(
    conn: &Connection,
    kind: EntityKind,
    entity_id: &str,
    member_id: &str,
) -> Result<bool> {
    let deleted = conn.execute(
        &format!(
            "DELETE FROM {} WHERE id = ?1 AND {} = ?2",
            kind.member_table(),
            kind.fk_column()
        ),
        params![member_id, entity_id],
    )?;
    Ok(deleted > 0)
}
