use crate::common::*;

#[tokio::test]
async fn test_stats_for_new_user_are_zero() {
    let t = TestApp::new();
    let ada = t.user("Ada");

    let (status, json) = t.get("/me/stats", &ada).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "total_projects": 0,
            "completed_projects": 0,
            "in_progress_projects": 0,
            "aborted_projects": 0,
            "projects_led": 0,
            "total_hackathons": 0,
            "upcoming_hackathons": 0,
            "ongoing_hackathons": 0,
            "completed_hackathons": 0,
            "hackathons_led": 0
        })
    );
}

#[tokio::test]
async fn test_stats_count_created_and_joined_entities() {
    let t = TestApp::new();
    let u1 = t.user("User One");
    let u2 = t.user("User Two");

    let (_, p1) = t
        .post("/projects", &u1, json!({ "title": "P1", "status": "completed" }))
        .await;
    assert_eq!(p1["status"], "completed");
    let p2 = t.project(&u2, "P2").await;
    t.project(&u2, "Unrelated").await;
    t.add_member(&format!("/projects/{}", p2), &u2, &u1, "Frontend Developer")
        .await;

    let h1 = t.hackathon(&u2, "H1").await;
    t.add_member(&format!("/hackathons/{}", h1), &u2, &u1, "Team Lead")
        .await;

    let (status, json) = t.get("/me/stats", &u1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_projects"], 2);
    assert_eq!(json["completed_projects"], 1);
    assert_eq!(json["in_progress_projects"], 1);
    assert_eq!(json["aborted_projects"], 0);
    assert_eq!(json["projects_led"], 0);
    assert_eq!(json["total_hackathons"], 1);
    assert_eq!(json["upcoming_hackathons"], 1);
    assert_eq!(json["hackathons_led"], 1);
}

#[tokio::test]
async fn test_report_is_a_download() {
    let t = TestApp::new();
    let ada = t.user("Ada Lovelace");
    t.project(&ada, "Engine").await;

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/me/report")
                .header("Authorization", format!("Bearer {}", ada.key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"Ada_Lovelace_report.txt\""
    );
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("Name: Ada Lovelace"));
    assert!(text.contains("Email: ada.lovelace@example.com"));
    assert!(text.contains("Total Projects: 1"));
    assert!(text.contains("Hackathons Led: 0"));
}
