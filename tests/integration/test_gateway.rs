//! End-to-end tests for the gateway HTTP API.
//!
//! Each test serves the real router on an ephemeral port. The local model
//! server and the cloud model API are replaced by `httpmock` servers, so the
//! real providers, routing and fallback paths are exercised.

use std::net::SocketAddr;

use httpmock::prelude::*;
use sahayak_gateway::fallback::fallback_text;
use sahayak_gateway::{create_router, AppState, Config, RequestDescriptor};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const LOCAL_MODEL: &str = "llama3:latest";

/// Serves the gateway for `config` and returns its base URL.
async fn spawn_gateway(config: Config) -> String {
    let state = AppState::connect(config).await;
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr: SocketAddr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, create_router(state))
            .await
            .expect("Gateway server failed");
    });
    format!("http://{addr}")
}

/// Configuration pointing both model providers at mock servers.
///
/// `cloud` is `None` to leave the cloud provider without a key.
fn config(local: &MockServer, cloud: Option<&MockServer>) -> Config {
    let mut config = Config::default();
    config.local_model.base_url = local.base_url();
    config.local_model.preferred_model = LOCAL_MODEL.to_string();
    if let Some(cloud) = cloud {
        config.cloud_model.base_url = cloud.base_url();
        config.cloud_model.api_key = Some("integration-key".to_string());
    }
    config.visual.stock_photo_base = local.url("/stock");
    config
}

/// Makes `server` answer the model listing probe.
async fn mock_model_listing(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({
                "models": [{ "name": "mistral:7b" }, { "name": LOCAL_MODEL }]
            }));
        })
        .await;
}

async fn post_json(base: &str, path: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .expect("Request failed");
    let status = response.status().as_u16();
    let json = response.json().await.expect("Response was not JSON");
    (status, json)
}

/// Tests that content is generated by the local model when it is up.
#[tokio::test]
async fn test_content_served_by_local_model() {
    let local = MockServer::start_async().await;
    mock_model_listing(&local).await;
    let generate = local
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .json_body_partial(json!({ "model": LOCAL_MODEL, "stream": false }).to_string())
                .body_contains("Rain");
            then.status(200)
                .json_body(json!({ "response": "Rain falls when clouds get heavy." }));
        })
        .await;

    let base = spawn_gateway(config(&local, None)).await;
    let (status, body) = post_json(
        &base,
        "/content/generate",
        json!({ "topic": "Rain", "language": "en", "gradeLevel": "3" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["content"], "Rain falls when clouds get heavy.");
    assert_eq!(body["topic"], "Rain");
    generate.assert_async().await;
}

/// Tests that the cloud model answers when the local server is down.
#[tokio::test]
async fn test_cloud_answers_when_local_is_down() {
    // No listing mock: the probe gets a 404 and the local provider stays unavailable
    let local = MockServer::start_async().await;
    let cloud = MockServer::start_async().await;
    let generate = cloud
        .mock_async(|when, then| {
            when.method(POST)
                .path_contains(":generateContent")
                .query_param("key", "integration-key");
            then.status(200).json_body(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Because of sunlight." }] } }]
            }));
        })
        .await;

    let base = spawn_gateway(config(&local, Some(&cloud))).await;
    let (status, body) = post_json(
        &base,
        "/knowledge/ask",
        json!({ "question": "Why is the sky blue?", "language": "en", "complexity": "simple" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["answer"], "Because of sunlight.");
    generate.assert_async().await;
}

/// Tests that localized fallback text is served when no model is reachable.
#[tokio::test]
async fn test_fallback_text_without_any_model() {
    let local = MockServer::start_async().await;
    let base = spawn_gateway(config(&local, None)).await;

    let (status, body) = post_json(
        &base,
        "/content/generate",
        json!({ "topic": "Rain", "language": "hi", "gradeLevel": "2" }),
    )
    .await;

    let descriptor = RequestDescriptor::new("Rain")
        .with_language("hi")
        .with_grade("2");
    assert_eq!(status, 200);
    assert_eq!(
        body["content"],
        fallback_text(&descriptor.language, "Rain", descriptor.grade())
    );
}

/// Tests that a failing cloud call degrades to fallback text, not an error.
#[tokio::test]
async fn test_cloud_quota_error_degrades_to_fallback() {
    let local = MockServer::start_async().await;
    let cloud = MockServer::start_async().await;
    cloud
        .mock_async(|when, then| {
            when.method(POST);
            then.status(429)
                .body(r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#);
        })
        .await;

    let base = spawn_gateway(config(&local, Some(&cloud))).await;
    let (status, body) = post_json(
        &base,
        "/lessons/generate",
        json!({ "topic": "Fractions", "subject": "math", "language": "en", "gradeLevel": "4" }),
    )
    .await;

    assert_eq!(status, 200);
    let plan = body["lessonPlan"].as_str().expect("lessonPlan missing");
    assert!(plan.contains("Fractions"), "fallback should mention the topic: {plan}");
}

/// Tests that one worksheet is produced per requested grade.
#[tokio::test]
async fn test_worksheets_for_each_grade() {
    let local = MockServer::start_async().await;
    mock_model_listing(&local).await;
    local
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .json_body(json!({ "response": "1. Count the apples." }));
        })
        .await;

    let base = spawn_gateway(config(&local, None)).await;
    let (status, body) = post_json(
        &base,
        "/worksheets/generate",
        json!({ "subject": "math", "grades": ["2", 4], "language": "en", "topic": "Counting" }),
    )
    .await;

    assert_eq!(status, 200);
    let worksheets = body["worksheets"].as_array().expect("worksheets missing");
    assert_eq!(worksheets.len(), 2);
    assert_eq!(worksheets[0]["grade"], "2");
    assert_eq!(worksheets[1]["grade"], "4");
    for sheet in worksheets {
        let content = sheet["content"].as_str().expect("content missing");
        assert!(content.contains("1. Count the apples."));
    }
}

/// Tests that a missing topic is rejected with a JSON error body.
#[tokio::test]
async fn test_missing_topic_is_bad_request() {
    let local = MockServer::start_async().await;
    let base = spawn_gateway(config(&local, None)).await;

    let (status, body) = post_json(&base, "/content/generate", json!({ "language": "en" })).await;

    assert_eq!(status, 400);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("topic")));
}

/// Tests that visuals fall back to the placeholder when no source succeeds.
#[tokio::test]
async fn test_visual_falls_back_to_placeholder() {
    // The stock photo check hits the mock and gets a 404
    let local = MockServer::start_async().await;
    let cfg = config(&local, None);
    let placeholder_base = cfg.visual.placeholder_base.clone();
    let base = spawn_gateway(cfg).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/visuals/generate-image"))
        .query(&[("prompt", "Water cycle"), ("style", "diagram"), ("subject", "science")])
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Response was not JSON");

    assert_eq!(body["strategy"], "placeholder");
    assert!(body["imageUrl"]
        .as_str()
        .is_some_and(|url| url.starts_with(&placeholder_base)));
}

/// Tests that health reports the resolved local model and visual strategies.
#[tokio::test]
async fn test_health_reports_providers() {
    let local = MockServer::start_async().await;
    mock_model_listing(&local).await;
    let base = spawn_gateway(config(&local, None)).await;

    let body: Value = reqwest::get(format!("{base}/health?refresh=true"))
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Response was not JSON");

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["local"]["available"], true);
    assert_eq!(body["local"]["model"], LOCAL_MODEL);
    assert_eq!(body["cloud"]["available"], false);
    let visuals = body["visuals"].as_array().expect("visuals missing");
    assert_eq!(visuals.last().map(|v| &v["strategy"]), Some(&json!("placeholder")));
}
