use crate::common::*;

fn roles(roster: &Value) -> Vec<(String, String)> {
    roster
        .as_array()
        .unwrap()
        .iter()
        .map(|m| {
            (
                m["user_id"].as_str().unwrap().to_string(),
                m["role"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_roster_includes_profiles_in_insertion_order() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let cy = t.user("Cy");
    let base = format!("/projects/{}", t.project(&ada, "Tracker").await);

    t.add_member(&base, &ada, &cy, "Team Lead").await;
    t.add_member(&base, &ada, &bob, "Designer").await;

    let (status, json) = t.get(&format!("{}/members", base), &ada).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        roles(&json),
        vec![
            (cy.id().to_string(), "Team Lead".to_string()),
            (bob.id().to_string(), "Designer".to_string()),
        ]
    );
    assert_eq!(json[0]["is_lead"], true);
    assert_eq!(json[0]["entity_id"], json!(base.trim_start_matches("/projects/")));
    assert_eq!(json[1]["profile"]["full_name"], "Bob");
}

#[tokio::test]
async fn test_second_team_lead_rejected_and_roster_unchanged() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let cy = t.user("Cy");
    let base = format!("/projects/{}", t.project(&ada, "Tracker").await);
    t.add_member(&base, &ada, &bob, "Team Lead").await;

    let (status, json) = t
        .post(
            &format!("{}/members", base),
            &ada,
            json!({ "user_id": cy.id(), "role": "Team Lead" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["error"],
        "A project can only have one Team Lead. Please change the existing Team Lead's role first."
    );

    let (_, json) = t.get(&format!("{}/members", base), &ada).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_member_rejected_for_any_role() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let base = format!("/hackathons/{}", t.hackathon(&ada, "Jam").await);
    t.add_member(&base, &ada, &bob, "Designer").await;

    for role in ["Designer", "Other", "Team Lead"] {
        let (status, json) = t
            .post(
                &format!("{}/members", base),
                &ada,
                json!({ "user_id": bob.id(), "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", role);
        assert_eq!(json["error"], "This user is already a team member.");
    }
}

#[tokio::test]
async fn test_add_unknown_user_not_found() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let base = format!("/projects/{}", t.project(&ada, "Tracker").await);

    let (status, json) = t
        .post(
            &format!("{}/members", base),
            &ada,
            json!({ "user_id": "ghost", "role": "Other" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "User not found");
}

#[tokio::test]
async fn test_role_defaults_to_frontend_developer() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let base = format!("/projects/{}", t.project(&ada, "Tracker").await);

    let (status, json) = t
        .post(&format!("{}/members", base), &ada, json!({ "user_id": bob.id() }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["role"], "Frontend Developer");
    assert_eq!(json[0]["is_lead"], false);
}

#[tokio::test]
async fn test_update_role_respects_single_lead() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let cy = t.user("Cy");
    let base = format!("/hackathons/{}", t.hackathon(&ada, "Jam").await);
    let bob_member = t.add_member(&base, &ada, &bob, "Team Lead").await;
    let cy_member = t.add_member(&base, &ada, &cy, "Designer").await;

    let (status, _) = t
        .put(
            &format!("{}/members/{}", base, cy_member),
            &ada,
            json!({ "role": "Team Lead" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // The current lead may keep the role
    let (status, _) = t
        .put(
            &format!("{}/members/{}", base, bob_member),
            &ada,
            json!({ "role": "Team Lead" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .put(
            &format!("{}/members/{}", base, bob_member),
            &ada,
            json!({ "role": "Backend Developer" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = t
        .put(
            &format!("{}/members/{}", base, cy_member),
            &ada,
            json!({ "role": "Team Lead" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        roles(&json),
        vec![
            (bob.id().to_string(), "Backend Developer".to_string()),
            (cy.id().to_string(), "Team Lead".to_string()),
        ]
    );

    let (status, json) = t
        .put(
            &format!("{}/members/unknown", base),
            &ada,
            json!({ "role": "Other" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Team member not found");
}

#[tokio::test]
async fn test_remove_member_and_visibility_follows() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let cy = t.user("Cy");
    let project = t.project(&ada, "Tracker").await;
    let base = format!("/projects/{}", project);
    let bob_member = t.add_member(&base, &ada, &bob, "Designer").await;
    t.add_member(&base, &ada, &cy, "Other").await;

    let (status, _) = t.get(&base, &bob).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = t
        .delete(&format!("{}/members/{}", base, bob_member), &ada)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roles(&json), vec![(cy.id().to_string(), "Other".to_string())]);

    let (status, _) = t.get(&base, &bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, json) = t.get("/projects", &bob).await;
    assert!(ids(&json).is_empty());

    let (status, _) = t
        .delete(&format!("{}/members/{}", base, bob_member), &ada)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_candidates_exclude_current_members() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let cy = t.user("Cy");
    let base = format!("/projects/{}", t.project(&ada, "Tracker").await);
    t.add_member(&base, &ada, &bob, "Designer").await;

    let (status, json) = t.get(&format!("{}/members/candidates", base), &ada).await;
    assert_eq!(status, StatusCode::OK);
    let candidates = ids(&json);
    assert_eq!(candidates, vec![ada.id().to_string(), cy.id().to_string()]);
}

#[tokio::test]
async fn test_outsider_cannot_manage_members() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let eve = t.user("Eve");
    let base = format!("/projects/{}", t.project(&ada, "Tracker").await);

    let (status, _) = t
        .post(
            &format!("{}/members", base),
            &eve,
            json!({ "user_id": eve.id(), "role": "Team Lead" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.get(&format!("{}/members", base), &eve).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
