use axum::extract::{Extension, State};
use serde_json::json;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::feed::{ChangeEvent, Table};
use crate::middleware::UserContext;
use crate::models::{CreateProject, EntityKind, Project, UpdateProject};
use crate::tech_stack::join_tech_stack;
use crate::team::visible_entities;

use super::access::{require_creator, resolve_scoped_write, visible_project};

pub async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(mut input): Json<CreateProject>,
) -> Result<Json<Project>> {
    input.normalize();
    input.validate().map_err(AppError::Validation)?;

    let conn = state.db.get()?;
    let project = queries::create_project(&conn, ctx.user_id(), &input)?;

    tracing::info!(
        project_id = %project.id,
        user_id = %ctx.user_id(),
        tech_stack = %join_tech_stack(&project.tech_stack),
        "Project created"
    );
    state.feed.publish(ChangeEvent::entity(EntityKind::Project, &project.id));

    let project = queries::get_project_by_id(&conn, &project.id)?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
    Ok(Json(project))
}

/// Projects the caller created or belongs to, newest first.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<Project>>> {
    let conn = state.db.get()?;
    let projects = queries::list_projects(&conn)?;
    let memberships = queries::list_all_memberships(&conn, EntityKind::Project)?;
    Ok(Json(visible_entities(&projects, &memberships, ctx.user_id())))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Project>> {
    let conn = state.db.get()?;
    let project = visible_project(&conn, &id, ctx.user_id())?;
    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    Json(mut input): Json<UpdateProject>,
) -> Result<Json<Project>> {
    input.normalize();
    input.validate().map_err(AppError::Validation)?;

    let conn = state.db.get()?;
    let user_id = ctx.user_id();
    visible_project(&conn, &id, user_id)?;

    let outcome = queries::update_project(&conn, &id, user_id, &input)?;
    resolve_scoped_write(&conn, EntityKind::Project, &id, user_id, outcome, || {
        queries::update_project_as_creator(&conn, &id, user_id, &input)
    })?;

    tracing::info!(project_id = %id, user_id = %user_id, ?outcome, "Project updated");
    state.feed.publish(ChangeEvent::entity(EntityKind::Project, &id));

    let project = queries::get_project_by_id(&conn, &id)?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let project = visible_project(&conn, &id, ctx.user_id())?;
    require_creator(EntityKind::Project, &project.created_by, ctx.user_id())?;

    if !queries::delete_project(&conn, &id)? {
        return Err(AppError::NotFound("Project not found".into()));
    }

    tracing::info!(project_id = %id, user_id = %ctx.user_id(), "Project deleted");
    // Memberships and hackathon links went with it
    state.feed.publish(ChangeEvent::entity(EntityKind::Project, &id));
    state.feed.publish(ChangeEvent::roster(EntityKind::Project, &id));
    state.feed.publish(ChangeEvent::new(Table::HackathonProjects, None));

    Ok(Json(json!({ "deleted": true })))
}
