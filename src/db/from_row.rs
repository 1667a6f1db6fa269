//! Row mapping for the query helpers.

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{Connection, Params, Row, types::Type};

use crate::error::Result;
use crate::models::*;

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

pub fn query_one<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(T::from_row(row)?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let items = stmt
        .query_map(params, |row| T::from_row(row))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

/// Parse a TEXT column through `FromStr` (enums stored by name).
fn parse_col<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    row.get::<_, String>(idx)?
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn tech_stack_col(row: &Row, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(Vec::new()),
    }
}

fn date_col(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub const PROFILE_COLS: &str = "id, email, full_name, created_at, updated_at";

pub const PROJECT_COLS: &str = "id, title, short_description, problem_statement, solution_description, tech_stack, github_url, deployed_url, download_url, qr_code_url, status, created_by, created_at, updated_at";

pub const HACKATHON_COLS: &str = "id, title, short_description, problem_statement, solution_description, tech_stack, github_url, deployed_url, download_url, qr_code_url, start_date, end_date, status, created_by, created_at, updated_at";

pub const HACKATHON_PROJECT_COLS: &str = "id, hackathon_id, project_id, created_at";

/// Member tables name their entity column differently; select it as `entity_id`.
pub fn membership_cols(kind: EntityKind) -> String {
    format!(
        "id, {} AS entity_id, user_id, role, is_lead, created_at",
        kind.fk_column()
    )
}

impl FromRow for Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Profile {
            id: row.get(0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl FromRow for Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Project {
            id: row.get(0)?,
            title: row.get(1)?,
            short_description: row.get(2)?,
            problem_statement: row.get(3)?,
            solution_description: row.get(4)?,
            tech_stack: tech_stack_col(row, 5)?,
            github_url: row.get(6)?,
            deployed_url: row.get(7)?,
            download_url: row.get(8)?,
            qr_code_url: row.get(9)?,
            status: parse_col(row, 10)?,
            created_by: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

impl FromRow for Hackathon {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Hackathon {
            id: row.get(0)?,
            title: row.get(1)?,
            short_description: row.get(2)?,
            problem_statement: row.get(3)?,
            solution_description: row.get(4)?,
            tech_stack: tech_stack_col(row, 5)?,
            github_url: row.get(6)?,
            deployed_url: row.get(7)?,
            download_url: row.get(8)?,
            qr_code_url: row.get(9)?,
            start_date: date_col(row, 10)?,
            end_date: date_col(row, 11)?,
            status: parse_col(row, 12)?,
            created_by: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}

impl FromRow for Membership {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Membership {
            id: row.get(0)?,
            entity_id: row.get(1)?,
            user_id: row.get(2)?,
            role: parse_col(row, 3)?,
            is_lead: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for HackathonProject {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(HackathonProject {
            id: row.get(0)?,
            hackathon_id: row.get(1)?,
            project_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}
