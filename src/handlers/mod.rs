mod access;
mod hackathons;
mod members;
mod profiles;
mod projects;

pub use hackathons::*;
pub use members::*;
pub use profiles::*;
pub use projects::*;

use axum::{
    Extension, Router, middleware,
    routing::{delete, get, post, put},
};
use serde_json::json;
use strum::IntoEnumIterator;

use crate::db::AppState;
use crate::extractors::Json;
use crate::middleware::user_auth;
use crate::models::{EntityKind, TeamRole};

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Role vocabulary in display order, for role pickers.
pub async fn list_roles() -> Json<Vec<TeamRole>> {
    Json(TeamRole::iter().collect())
}

/// Member routes for one entity kind, e.g. `/projects/{id}/members`.
fn member_routes(kind: EntityKind) -> Router<AppState> {
    let base = format!("/{}/{{id}}/members", kind.entity_table());

    Router::new()
        .route(&base, get(list_members).post(add_member))
        .route(&format!("{}/candidates", base), get(list_candidates))
        .route(&format!("{}/live", base), get(live_members))
        .route(
            &format!("{}/{{member_id}}", base),
            put(update_member).delete(remove_member),
        )
        .layer(Extension(kind))
}

pub fn router(state: AppState) -> Router<AppState> {
    let authed = Router::new()
        .route("/me", get(get_me))
        .route("/me/sign-out", post(sign_out))
        .route("/me/stats", get(my_stats))
        .route("/me/report", get(my_report))
        .route("/profiles", get(list_profiles))
        .route("/roles", get(list_roles))
        // Projects
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        // Hackathons
        .route("/hackathons", get(list_hackathons).post(create_hackathon))
        .route(
            "/hackathons/{id}",
            get(get_hackathon)
                .put(update_hackathon)
                .delete(delete_hackathon),
        )
        .route(
            "/hackathons/{id}/projects",
            get(list_hackathon_projects).post(link_hackathon_project),
        )
        .route(
            "/hackathons/{id}/projects/{project_id}",
            delete(unlink_hackathon_project),
        )
        .merge(member_routes(EntityKind::Project))
        .merge(member_routes(EntityKind::Hackathon))
        .layer(middleware::from_fn_with_state(state, user_auth));

    Router::new().route("/health", get(health)).merge(authed)
}
