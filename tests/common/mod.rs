//! Shared fixtures for integration tests.
#![allow(dead_code)]

pub use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
pub use serde_json::{Value, json};
pub use tower::ServiceExt;

use rusqlite::Connection;
use tempfile::TempDir;

use teamtrack::db::{AppState, create_pool, queries};
use teamtrack::feed::ChangeFeed;
use teamtrack::models::{CreateProfile, Profile};

/// App state over a fresh file database. Keep the `TempDir` alive for the
/// duration of the test; every pooled connection opens the same file.
pub fn test_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("teamtrack-test.db");
    let pool = create_pool(path.to_str().unwrap()).unwrap();
    (AppState::new(pool, ChangeFeed::new(64)), dir)
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let (state, dir) = test_state();
        Self {
            app: teamtrack::app(state.clone()),
            state,
            _dir: dir,
        }
    }

    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.state.db.get().unwrap()
    }

    /// Create a user and return it with a working API key.
    pub fn user(&self, name: &str) -> TestUser {
        let conn = self.conn();
        let (profile, key) = create_test_user(&conn, name);
        TestUser { profile, key }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request("GET", uri, Some(&user.key), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(&user.key), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(&user.key), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(&user.key), None).await
    }

    /// Create a project as `owner` and return its id.
    pub async fn project(&self, owner: &TestUser, title: &str) -> String {
        let (status, json) = self
            .post("/projects", owner, json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::OK, "create project: {}", json);
        json["id"].as_str().unwrap().to_string()
    }

    pub async fn hackathon(&self, owner: &TestUser, title: &str) -> String {
        let (status, json) = self
            .post("/hackathons", owner, json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::OK, "create hackathon: {}", json);
        json["id"].as_str().unwrap().to_string()
    }

    /// Add `member` to an entity's team and return the new membership id.
    pub async fn add_member(
        &self,
        base: &str,
        actor: &TestUser,
        member: &TestUser,
        role: &str,
    ) -> String {
        let (status, json) = self
            .post(
                &format!("{}/members", base),
                actor,
                json!({ "user_id": member.id(), "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add member: {}", json);
        member_id_of(&json, member.id())
    }
}

pub struct TestUser {
    pub profile: Profile,
    pub key: String,
}

impl TestUser {
    pub fn id(&self) -> &str {
        &self.profile.id
    }
}

pub fn create_test_user(conn: &Connection, name: &str) -> (Profile, String) {
    let profile = queries::create_profile(
        conn,
        &CreateProfile {
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            full_name: name.to_string(),
        },
    )
    .unwrap();
    let key = queries::create_api_key(conn, &profile.id).unwrap();
    (profile, key)
}

/// Membership id of `user_id` in a roster response.
pub fn member_id_of(roster: &Value, user_id: &str) -> String {
    roster
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["user_id"] == user_id)
        .and_then(|m| m["id"].as_str())
        .unwrap()
        .to_string()
}

pub fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect()
}
