use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::json;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::feed::{ChangeEvent, RowFilter, Table};
use crate::middleware::UserContext;
use crate::models::{
    CreateHackathon, EntityKind, Hackathon, HackathonProject, LinkHackathonProject,
    UpdateHackathon,
};
use crate::team::visible_entities;

use super::access::{require_creator, resolve_scoped_write, visible_hackathon, visible_project};

#[derive(Deserialize)]
pub struct HackathonProjectPath {
    pub id: String,
    pub project_id: String,
}

fn links_changed(hackathon_id: &str) -> ChangeEvent {
    ChangeEvent::new(
        Table::HackathonProjects,
        Some(RowFilter::eq("hackathon_id", hackathon_id)),
    )
}

pub async fn create_hackathon(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(mut input): Json<CreateHackathon>,
) -> Result<Json<Hackathon>> {
    input.normalize();
    input.validate().map_err(AppError::Validation)?;

    let conn = state.db.get()?;
    let hackathon = queries::create_hackathon(&conn, ctx.user_id(), &input)?;

    tracing::info!(hackathon_id = %hackathon.id, user_id = %ctx.user_id(), "Hackathon created");
    state.feed.publish(ChangeEvent::entity(EntityKind::Hackathon, &hackathon.id));

    let hackathon = queries::get_hackathon_by_id(&conn, &hackathon.id)?
        .ok_or_else(|| AppError::NotFound("Hackathon not found".into()))?;
    Ok(Json(hackathon))
}

pub async fn list_hackathons(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<Hackathon>>> {
    let conn = state.db.get()?;
    let hackathons = queries::list_hackathons(&conn)?;
    let memberships = queries::list_all_memberships(&conn, EntityKind::Hackathon)?;
    Ok(Json(visible_entities(&hackathons, &memberships, ctx.user_id())))
}

pub async fn get_hackathon(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Hackathon>> {
    let conn = state.db.get()?;
    let hackathon = visible_hackathon(&conn, &id, ctx.user_id())?;
    Ok(Json(hackathon))
}

pub async fn update_hackathon(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    Json(mut input): Json<UpdateHackathon>,
) -> Result<Json<Hackathon>> {
    let conn = state.db.get()?;
    let user_id = ctx.user_id();
    let existing = visible_hackathon(&conn, &id, user_id)?;

    input.normalize();
    input.validate(&existing).map_err(AppError::Validation)?;

    let outcome = queries::update_hackathon(&conn, &id, user_id, &input)?;
    resolve_scoped_write(&conn, EntityKind::Hackathon, &id, user_id, outcome, || {
        queries::update_hackathon_as_creator(&conn, &id, user_id, &input)
    })?;

    tracing::info!(hackathon_id = %id, user_id = %user_id, ?outcome, "Hackathon updated");
    state.feed.publish(ChangeEvent::entity(EntityKind::Hackathon, &id));

    let hackathon = queries::get_hackathon_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("Hackathon not found".into()))?;
    Ok(Json(hackathon))
}

pub async fn delete_hackathon(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let hackathon = visible_hackathon(&conn, &id, ctx.user_id())?;
    require_creator(EntityKind::Hackathon, &hackathon.created_by, ctx.user_id())?;

    if !queries::delete_hackathon(&conn, &id)? {
        return Err(AppError::NotFound("Hackathon not found".into()));
    }

    tracing::info!(hackathon_id = %id, user_id = %ctx.user_id(), "Hackathon deleted");
    state.feed.publish(ChangeEvent::entity(EntityKind::Hackathon, &id));
    state.feed.publish(ChangeEvent::roster(EntityKind::Hackathon, &id));
    state.feed.publish(links_changed(&id));

    Ok(Json(json!({ "deleted": true })))
}

// ============ Submitted projects ============

pub async fn list_hackathon_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HackathonProject>>> {
    let conn = state.db.get()?;
    visible_hackathon(&conn, &id, ctx.user_id())?;
    Ok(Json(queries::list_hackathon_projects(&conn, &id)?))
}

/// Link one of the caller's visible projects to the hackathon.
pub async fn link_hackathon_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<LinkHackathonProject>,
) -> Result<Json<Vec<HackathonProject>>> {
    let conn = state.db.get()?;
    visible_hackathon(&conn, &id, ctx.user_id())?;
    visible_project(&conn, &input.project_id, ctx.user_id())?;

    queries::link_hackathon_project(&conn, &id, &input.project_id)?;

    tracing::info!(hackathon_id = %id, project_id = %input.project_id, "Project linked to hackathon");
    state.feed.publish(links_changed(&id));

    Ok(Json(queries::list_hackathon_projects(&conn, &id)?))
}

pub async fn unlink_hackathon_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(path): Path<HackathonProjectPath>,
) -> Result<Json<Vec<HackathonProject>>> {
    let conn = state.db.get()?;
    visible_hackathon(&conn, &path.id, ctx.user_id())?;

    if !queries::unlink_hackathon_project(&conn, &path.id, &path.project_id)? {
        return Err(AppError::NotFound("Project is not linked to this hackathon".into()));
    }

    tracing::info!(hackathon_id = %path.id, project_id = %path.project_id, "Project unlinked from hackathon");
    state.feed.publish(links_changed(&path.id));

    Ok(Json(queries::list_hackathon_projects(&conn, &path.id)?))
}
