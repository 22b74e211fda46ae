//! E2E tests for public catalog browsing

mod common;

use common::TestServer;
use serde_json::Value;

async fn get_json(server: &TestServer, path: &str) -> (u16, Value) {
    let response = server.client.get(server.url(path)).send().await.unwrap();
    let status = response.status().as_u16();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_public_listing_hides_drafts() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;

    server
        .create_video(&admin, "Morning Light", "Published", "beach, summer")
        .await;
    let draft = server
        .create_video(&admin, "Unreleased Cut", "Draft", "beach")
        .await;

    let (status, page) = get_json(&server, "/api/videos").await;
    assert_eq!(status, 200);
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["items"][0]["title"], "Morning Light");

    let draft_id = draft["id"].as_str().unwrap();
    let (status, _) = get_json(&server, &format!("/api/videos/{draft_id}")).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_video_detail_includes_related() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;

    let target = server
        .create_video(&admin, "Coastline", "Published", "beach")
        .await;
    server
        .create_video(&admin, "Dunes", "Published", "beach, desert")
        .await;
    server
        .create_video(&admin, "City Nights", "Published", "urban")
        .await;

    let id = target["id"].as_str().unwrap();
    let (status, detail) = get_json(&server, &format!("/api/videos/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(detail["video"]["id"], id);

    let related = detail["related"].as_array().unwrap();
    assert_eq!(related.len(), 2);
    assert_eq!(related[0]["title"], "Dunes");
    assert!(related.iter().all(|video| video["id"] != id));
}

#[tokio::test]
async fn test_listing_search_and_pagination() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;

    for n in 0..5 {
        server
            .create_video(&admin, &format!("Session {n}"), "Published", "studio")
            .await;
    }
    server
        .create_video(&admin, "Harbour Walk", "Published", "outdoor")
        .await;

    let (_, page) = get_json(&server, "/api/videos?page=2&pageSize=4").await;
    assert_eq!(page["totalItems"], 6);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);

    let (_, filtered) = get_json(&server, "/api/videos?search=harbour").await;
    assert_eq!(filtered["totalItems"], 1);
}

#[tokio::test]
async fn test_search_requires_every_term() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;

    server
        .create_video(&admin, "Golden Hour", "Published", "beach, sunset")
        .await;
    server
        .create_video(&admin, "Blue Hour", "Published", "beach")
        .await;

    let (status, results) = get_json(&server, "/api/search?q=beach%20sunset").await;
    assert_eq!(status, 200);
    let videos = results["videos"].as_array().unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["title"], "Golden Hour");

    let (_, results) = get_json(&server, "/api/search?q=ava&type=models").await;
    assert!(results["videos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_tag_registry_tracks_content() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;

    let video = server
        .create_video(&admin, "Tagged", "Draft", "Beach, beach, Summer")
        .await;
    let (_, tags) = get_json(&server, "/api/tags").await;
    assert_eq!(tags["beach"], 1);
    assert_eq!(tags["summer"], 1);

    let id = video["id"].as_str().unwrap();
    let response = server
        .client
        .delete(server.url(&format!("/admin/videos/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let (_, tags) = get_json(&server, "/api/tags").await;
    assert!(tags.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_home_feed_is_stable_for_a_seed() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;

    let response = server
        .client
        .post(server.url("/admin/seed"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let (status, first) = get_json(&server, "/api/home?seed=42").await;
    assert_eq!(status, 200);
    let (_, second) = get_json(&server, "/api/home?seed=42").await;
    assert_eq!(first, second);
    assert!(!first["featured"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_model_detail_lists_their_content() {
    let server = TestServer::new().await;
    let admin = server.admin_token().await;

    let response = server
        .client
        .post(server.url("/admin/models"))
        .bearer_auth(&admin)
        .json(&serde_json::json!({
            "name": "Ava Stone",
            "image": "https://cdn.example.com/ava.jpg",
            "status": "Published",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let model: Value = response.json().await.unwrap();

    server
        .create_video(&admin, "Portrait Study", "Published", "studio")
        .await;
    server
        .create_video(&admin, "Hidden Take", "Draft", "studio")
        .await;

    let id = model["id"].as_str().unwrap();
    let (status, detail) = get_json(&server, &format!("/api/models/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(detail["model"]["name"], "Ava Stone");
    assert_eq!(detail["videos"].as_array().unwrap().len(), 1);
}
