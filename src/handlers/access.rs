//! Visibility checks and write-outcome resolution shared by the entity handlers.

use rusqlite::Connection;

use crate::db::queries::{self, WriteOutcome};
use crate::error::{AppError, Result};
use crate::models::{EntityKind, Hackathon, MembershipWithProfile, Project};
use crate::team::{Roster, is_visible};

pub fn not_found(kind: EntityKind) -> AppError {
    match kind {
        EntityKind::Project => AppError::NotFound("Project not found".into()),
        EntityKind::Hackathon => AppError::NotFound("Hackathon not found".into()),
    }
}

/// Load a project the user may see. Missing and invisible look the same.
pub fn visible_project(conn: &Connection, id: &str, user_id: &str) -> Result<Project> {
    let project = queries::get_project_by_id(conn, id)?.ok_or_else(|| not_found(EntityKind::Project))?;
    let memberships = queries::list_memberships(conn, EntityKind::Project, id)?;
    if !is_visible(&project, &memberships, user_id) {
        return Err(not_found(EntityKind::Project));
    }
    Ok(project)
}

pub fn visible_hackathon(conn: &Connection, id: &str, user_id: &str) -> Result<Hackathon> {
    let hackathon =
        queries::get_hackathon_by_id(conn, id)?.ok_or_else(|| not_found(EntityKind::Hackathon))?;
    let memberships = queries::list_memberships(conn, EntityKind::Hackathon, id)?;
    if !is_visible(&hackathon, &memberships, user_id) {
        return Err(not_found(EntityKind::Hackathon));
    }
    Ok(hackathon)
}

/// Load the roster of an entity the user may see.
pub fn visible_roster(
    conn: &Connection,
    kind: EntityKind,
    entity_id: &str,
    user_id: &str,
) -> Result<Roster> {
    let creator = queries::get_entity_creator(conn, kind, entity_id)?.ok_or_else(|| not_found(kind))?;
    let roster = Roster::new(kind, entity_id, queries::list_memberships(conn, kind, entity_id)?);
    if creator != user_id && !roster.contains_user(user_id) {
        return Err(not_found(kind));
    }
    Ok(roster)
}

/// Current roster joined with member profiles, in roster order.
pub fn roster_with_profiles(
    conn: &Connection,
    kind: EntityKind,
    entity_id: &str,
) -> Result<Vec<MembershipWithProfile>> {
    let memberships = queries::list_memberships(conn, kind, entity_id)?;
    let user_ids: Vec<&str> = memberships.iter().map(|m| m.user_id.as_str()).collect();
    let profiles = queries::get_profiles_by_ids(conn, &user_ids)?;

    Ok(memberships
        .into_iter()
        .map(|membership| {
            let profile = profiles.iter().find(|p| p.id == membership.user_id).cloned();
            MembershipWithProfile { membership, profile }
        })
        .collect())
}

/// Settle a scoped update that matched no row.
///
/// The row is re-read: gone means 404; if the caller created it the
/// creator-only write is tried; anything else is reported as a permission
/// problem rather than a silent success.
pub fn resolve_scoped_write(
    conn: &Connection,
    kind: EntityKind,
    entity_id: &str,
    user_id: &str,
    outcome: WriteOutcome,
    retry_as_creator: impl FnOnce() -> Result<WriteOutcome>,
) -> Result<()> {
    if outcome != WriteOutcome::NoRowsAffected {
        return Ok(());
    }

    match queries::get_entity_creator(conn, kind, entity_id)? {
        None => Err(not_found(kind)),
        Some(creator) if creator == user_id => {
            tracing::debug!(
                entity = kind.label(),
                entity_id,
                user_id,
                "Member-scoped update matched no rows, retrying as creator"
            );
            match retry_as_creator()? {
                WriteOutcome::NoRowsAffected => Err(permission_denied(kind)),
                _ => Ok(()),
            }
        }
        Some(_) => {
            tracing::warn!(
                entity = kind.label(),
                entity_id,
                user_id,
                "Scoped update matched no rows"
            );
            Err(permission_denied(kind))
        }
    }
}

fn permission_denied(kind: EntityKind) -> AppError {
    AppError::Forbidden(format!(
        "Update failed. You may not have permission to edit this {}.",
        kind.label()
    ))
}

/// Deleting is reserved for the creator.
pub fn require_creator(kind: EntityKind, created_by: &str, user_id: &str) -> Result<()> {
    if created_by != user_id {
        return Err(AppError::Forbidden(format!(
            "Only the creator can delete this {}",
            kind.label()
        )));
    }
    Ok(())
}
