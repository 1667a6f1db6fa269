//! Team member management, shared by projects and hackathons.
//!
//! The routes are mounted once per [`EntityKind`]; the kind reaches the
//! handlers as a request extension. Every change is checked against the
//! in-memory [`Roster`](crate::team::Roster) before it is written, and the
//! database's unique indexes catch whatever a concurrent writer slipped in
//! between.

use std::convert::Infallible;

use axum::{
    extract::{Extension, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::feed::{ChangeEvent, LiveQuery, RowFilter, Table};
use crate::middleware::UserContext;
use crate::models::{CreateMember, EntityKind, MembershipWithProfile, Profile, UpdateMember};

use super::access::{roster_with_profiles, visible_roster};

#[derive(Deserialize)]
pub struct MemberPath {
    pub id: String,
    pub member_id: String,
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MembershipWithProfile>>> {
    let conn = state.db.get()?;
    visible_roster(&conn, kind, &id, ctx.user_id())?;
    Ok(Json(roster_with_profiles(&conn, kind, &id)?))
}

pub async fn add_member(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    Json(input): Json<CreateMember>,
) -> Result<Json<Vec<MembershipWithProfile>>> {
    let conn = state.db.get()?;
    let mut roster = visible_roster(&conn, kind, &id, ctx.user_id())?;

    if queries::get_profile_by_id(&conn, &input.user_id)?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let member = roster.add(&input.user_id, input.role)?;
    queries::insert_membership(&conn, kind, member)?;

    tracing::info!(
        entity = kind.label(),
        entity_id = %id,
        member_user_id = %input.user_id,
        role = %input.role,
        "Team member added"
    );
    state.feed.publish(ChangeEvent::roster(kind, &id));

    Ok(Json(roster_with_profiles(&conn, kind, &id)?))
}

pub async fn update_member(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Extension(ctx): Extension<UserContext>,
    Path(path): Path<MemberPath>,
    Json(input): Json<UpdateMember>,
) -> Result<Json<Vec<MembershipWithProfile>>> {
    let conn = state.db.get()?;
    let mut roster = visible_roster(&conn, kind, &path.id, ctx.user_id())?;

    roster.update_role(&path.member_id, input.role)?;
    if !queries::update_membership_role(&conn, kind, &path.id, &path.member_id, input.role)? {
        return Err(AppError::NotFound("Team member not found".into()));
    }

    tracing::info!(
        entity = kind.label(),
        entity_id = %path.id,
        member_id = %path.member_id,
        role = %input.role,
        "Team member role updated"
    );
    state.feed.publish(ChangeEvent::roster(kind, &path.id));

    Ok(Json(roster_with_profiles(&conn, kind, &path.id)?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Extension(ctx): Extension<UserContext>,
    Path(path): Path<MemberPath>,
) -> Result<Json<Vec<MembershipWithProfile>>> {
    let conn = state.db.get()?;
    let mut roster = visible_roster(&conn, kind, &path.id, ctx.user_id())?;

    // Removing an unknown id changes nothing; say so instead of pretending
    if roster.remove(&path.member_id).is_none()
        || !queries::delete_membership(&conn, kind, &path.id, &path.member_id)?
    {
        return Err(AppError::NotFound("Team member not found".into()));
    }

    tracing::info!(
        entity = kind.label(),
        entity_id = %path.id,
        member_id = %path.member_id,
        "Team member removed"
    );
    state.feed.publish(ChangeEvent::roster(kind, &path.id));

    Ok(Json(roster_with_profiles(&conn, kind, &path.id)?))
}

/// Profiles that can still be added to the team.
pub async fn list_candidates(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Profile>>> {
    let conn = state.db.get()?;
    let roster = visible_roster(&conn, kind, &id, ctx.user_id())?;
    let profiles = queries::list_profiles(&conn)?;

    Ok(Json(
        roster
            .available_profiles(&profiles)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

/// Refetch for a live roster. `None` once the reader may no longer see it:
/// removed from the team, the entity deleted, or the key signed out.
fn live_roster(
    conn: &Connection,
    kind: EntityKind,
    entity_id: &str,
    ctx: &UserContext,
) -> Result<Option<Vec<MembershipWithProfile>>> {
    if !queries::is_api_key_active(conn, &ctx.api_key)? {
        return Ok(None);
    }
    match visible_roster(conn, kind, entity_id, ctx.user_id()) {
        Ok(_) => roster_with_profiles(conn, kind, entity_id).map(Some),
        Err(AppError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Server-sent roster snapshots: the current roster first, then a fresh one
/// after every change to it. Closing the connection stops the refreshes; the
/// stream ends once the caller loses access.
pub async fn live_members(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    // Subscribe before the first read so no change falls in between
    let subscription = state.feed.subscribe(
        Table::members(kind),
        Some(RowFilter::eq(kind.fk_column(), id.clone())),
    );

    let initial = {
        let conn = state.db.get()?;
        visible_roster(&conn, kind, &id, ctx.user_id())?;
        roster_with_profiles(&conn, kind, &id)?
    };

    let db = state.db.clone();
    let entity_id = id.clone();
    let live = LiveQuery::spawn(initial, subscription, move || {
        let conn = db.get()?;
        live_roster(&conn, kind, &entity_id, &ctx)
    });

    tracing::debug!(entity = kind.label(), entity_id = %id, "Live roster opened");

    let events = stream::unfold((live, true), |(mut live, first)| async move {
        let snapshot = if first {
            live.snapshot()
        } else {
            live.changed().await?
        };
        let event = Event::default()
            .event("roster")
            .json_data(&*snapshot)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Some((Ok::<_, Infallible>(event), (live, false)))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
