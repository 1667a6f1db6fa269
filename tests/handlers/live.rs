use std::time::Duration;

use futures_util::StreamExt;

use crate::common::*;

/// Read body chunks until one contains a complete `roster` event.
async fn next_roster<S>(stream: &mut S) -> Value
where
    S: futures_util::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    let mut buffer = String::new();
    loop {
        while let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            if !frame.contains("event: roster") {
                continue;
            }
            let data = frame
                .lines()
                .find_map(|l| l.strip_prefix("data: "))
                .unwrap();
            return serde_json::from_str(data).unwrap();
        }

        let chunk = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out waiting for roster event")
            .expect("stream ended")
            .unwrap();
        buffer.push_str(std::str::from_utf8(&chunk).unwrap());
    }
}

/// Read until the body ends. No further roster may arrive on the way.
async fn expect_stream_end<S>(stream: &mut S)
where
    S: futures_util::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin,
{
    loop {
        let chunk = tokio::time::timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("timed out waiting for stream end");
        match chunk {
            None => return,
            Some(chunk) => {
                let text = String::from_utf8(chunk.unwrap().to_vec()).unwrap();
                assert!(!text.contains("event: roster"), "unexpected roster: {}", text);
            }
        }
    }
}

async fn open_live(t: &TestApp, uri: &str, user: &TestUser) -> axum::body::BodyDataStream {
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("Authorization", format!("Bearer {}", user.key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.into_body().into_data_stream()
}

#[tokio::test]
async fn test_live_roster_sends_fresh_snapshots() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let project = t.project(&ada, "Tracker").await;
    let base = format!("/projects/{}", project);

    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("{}/members/live", base))
                .header("Authorization", format!("Bearer {}", ada.key))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");

    let mut stream = response.into_body().into_data_stream();

    let initial = next_roster(&mut stream).await;
    assert_eq!(initial, json!([]));

    t.add_member(&base, &ada, &bob, "Team Lead").await;
    let updated = next_roster(&mut stream).await;
    assert_eq!(updated[0]["user_id"], bob.id());
    assert_eq!(updated[0]["profile"]["full_name"], "Bob");

    // Changes to other rosters don't wake this one
    let other = t.project(&ada, "Other").await;
    t.add_member(&format!("/projects/{}", other), &ada, &bob, "Designer")
        .await;
    let bob_member = member_id_of(&updated, bob.id());
    t.delete(&format!("{}/members/{}", base, bob_member), &ada)
        .await;

    let after_remove = next_roster(&mut stream).await;
    assert_eq!(after_remove, json!([]));
}

#[tokio::test]
async fn test_live_roster_hidden_from_outsiders() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let eve = t.user("Eve");
    let hackathon = t.hackathon(&ada, "Jam").await;

    let (status, _) = t
        .get(&format!("/hackathons/{}/members/live", hackathon), &eve)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(t.state.feed.subscriber_count(), 0);
}

#[tokio::test]
async fn test_live_roster_ends_for_removed_member() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let carol = t.user("Carol");
    let base = format!("/projects/{}", t.project(&ada, "Tracker").await);
    let bob_member = t.add_member(&base, &ada, &bob, "Designer").await;

    let mut stream = open_live(&t, &format!("{}/members/live", base), &bob).await;
    let initial = next_roster(&mut stream).await;
    assert_eq!(initial[0]["user_id"], bob.id());

    t.delete(&format!("{}/members/{}", base, bob_member), &ada)
        .await;
    t.add_member(&base, &ada, &carol, "Team Lead").await;

    expect_stream_end(&mut stream).await;
    assert_eq!(t.state.feed.subscriber_count(), 0);
}

#[tokio::test]
async fn test_live_roster_ends_after_sign_out() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let bob = t.user("Bob");
    let carol = t.user("Carol");
    let base = format!("/hackathons/{}", t.hackathon(&ada, "Jam").await);
    t.add_member(&base, &ada, &bob, "Designer").await;

    let mut stream = open_live(&t, &format!("{}/members/live", base), &bob).await;
    next_roster(&mut stream).await;

    let (status, _) = t
        .request("POST", "/me/sign-out", Some(&bob.key), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    t.add_member(&base, &ada, &carol, "Team Lead").await;

    expect_stream_end(&mut stream).await;
}

#[tokio::test]
async fn test_live_roster_ends_when_entity_deleted() {
    let t = TestApp::new();
    let ada = t.user("Ada");
    let base = format!("/projects/{}", t.project(&ada, "Tracker").await);

    let mut stream = open_live(&t, &format!("{}/members/live", base), &ada).await;
    assert_eq!(next_roster(&mut stream).await, json!([]));

    let (status, _) = t.delete(&base, &ada).await;
    assert_eq!(status, StatusCode::OK);

    expect_stream_end(&mut stream).await;
}
