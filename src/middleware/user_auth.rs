use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::error::AppError;
use crate::models::Profile;
use crate::util::extract_bearer_token;

/// The acting user, resolved from the request's API key. Handlers take the
/// user id from here; there is no other notion of "current user".
#[derive(Clone)]
pub struct UserContext {
    pub profile: Profile,
    /// Key presented on this request, so sign-out can revoke exactly it
    pub api_key: String,
}

impl UserContext {
    pub fn user_id(&self) -> &str {
        &self.profile.id
    }
}

pub async fn user_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = extract_bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing API key".into()))?
        .to_string();

    let conn = state.db.get()?;
    let profile = queries::get_profile_by_api_key(&conn, &api_key)?
        .ok_or_else(|| AppError::Unauthorized("Invalid API key".into()))?;
    drop(conn);

    tracing::debug!(user_id = %profile.id, "Authenticated request");
    request
        .extensions_mut()
        .insert(UserContext { profile, api_key });

    Ok(next.run(request).await)
}
