use axum::{
    extract::{Extension, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use rusqlite::Connection;
use serde_json::json;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::Json;
use crate::middleware::UserContext;
use crate::models::{EntityKind, Profile};
use crate::report::build_report;
use crate::stats::{UserStats, compute_stats};

pub async fn get_me(Extension(ctx): Extension<UserContext>) -> Json<Profile> {
    Json(ctx.profile)
}

/// Revoke the key this request was made with.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let revoked = queries::revoke_api_key(&conn, &ctx.api_key)?;

    tracing::info!(user_id = %ctx.user_id(), revoked, "Signed out");
    Ok(Json(json!({ "signed_out": true })))
}

pub async fn list_profiles(State(state): State<AppState>) -> Result<Json<Vec<Profile>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_profiles(&conn)?))
}

fn load_stats(conn: &Connection, user_id: &str) -> Result<UserStats> {
    let projects = queries::list_projects(conn)?;
    let project_memberships = queries::list_memberships_for_user(conn, EntityKind::Project, user_id)?;
    let hackathons = queries::list_hackathons(conn)?;
    let hackathon_memberships =
        queries::list_memberships_for_user(conn, EntityKind::Hackathon, user_id)?;

    Ok(compute_stats(
        user_id,
        &projects,
        &project_memberships,
        &hackathons,
        &hackathon_memberships,
    ))
}

pub async fn my_stats(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<UserStats>> {
    let conn = state.db.get()?;
    Ok(Json(load_stats(&conn, ctx.user_id())?))
}

/// The caller's statistics as a downloadable document.
pub async fn my_report(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Response> {
    let conn = state.db.get()?;
    let stats = load_stats(&conn, ctx.user_id())?;

    let layout = build_report(&ctx.profile, &stats, Utc::now());
    let document = state.renderer.render(&layout)?;

    tracing::info!(user_id = %ctx.user_id(), file_name = %document.file_name, "Report generated");

    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, document.content_disposition()),
        ],
        document.bytes,
    )
        .into_response())
}
