//! End-to-end tests for the reading assessment routes.
//!
//! Transcription uses the canned transcriber, so reading back its own English
//! passage must score as a perfect reading.

use std::net::SocketAddr;

use httpmock::prelude::*;
use reqwest::multipart::{Form, Part};
use sahayak_assessment::CannedTranscriber;
use sahayak_gateway::{create_router, AppState, Config};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn spawn_gateway(local: &MockServer) -> String {
    let mut config = Config::default();
    config.local_model.base_url = local.base_url();
    config.local_model.preferred_model = "llama3:latest".to_string();
    config.visual.stock_photo_base = local.url("/stock");

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

async fn mock_local_model(server: &MockServer, reply: &str) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200)
                .json_body(json!({ "models": [{ "name": "llama3:latest" }] }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({ "response": reply }));
        })
        .await;
}

fn reading_form(original_text: &str) -> Form {
    Form::new()
        .part(
            "audio",
            Part::bytes(b"RIFF fake wav".to_vec())
                .file_name("reading.wav")
                .mime_str("audio/wav")
                .expect("Invalid mime type"),
        )
        .text("originalText", original_text.to_string())
        .text("language", "en")
        .text("gradeLevel", "3")
}

/// Tests that a perfect reading scores every word correct.
#[tokio::test]
async fn test_analyze_perfect_reading() {
    let local = MockServer::start_async().await;
    mock_local_model(&local, "Wonderful reading!").await;
    let base = spawn_gateway(&local).await;

    let passage = CannedTranscriber::passage_for("en");
    let response = reqwest::Client::new()
        .post(format!("{base}/assessment/analyze"))
        .multipart(reading_form(passage))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Response was not JSON");

    assert_eq!(body["transcription"], passage);
    assert_eq!(body["totalWords"], body["correctWords"]);
    assert_eq!(body["mistakes"], json!([]));
    assert_eq!(body["missedWords"], json!([]));
    assert_eq!(body["feedback"], "Wonderful reading!");
}

/// Tests that substituted words are reported with their positions.
#[tokio::test]
async fn test_analyze_reports_substitutions() {
    let local = MockServer::start_async().await;
    mock_local_model(&local, "Good effort.").await;
    let base = spawn_gateway(&local).await;

    let original = CannedTranscriber::passage_for("en").replacen("cat", "dog", 1);
    let response = reqwest::Client::new()
        .post(format!("{base}/assessment/analyze"))
        .multipart(reading_form(&original))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Response was not JSON");

    let mistakes = body["mistakes"].as_array().expect("mistakes missing");
    assert_eq!(mistakes.len(), 1);
    assert_eq!(mistakes[0]["expectedWord"], "dog");
    assert_eq!(mistakes[0]["actualWord"], "cat");
}

/// Tests that a form without audio is rejected.
#[tokio::test]
async fn test_analyze_requires_audio() {
    let local = MockServer::start_async().await;
    let base = spawn_gateway(&local).await;

    let form = Form::new().text("originalText", "The cat sat.");
    let response = reqwest::Client::new()
        .post(format!("{base}/assessment/analyze"))
        .multipart(form)
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.expect("Response was not JSON");
    assert!(body["error"].as_str().is_some_and(|e| e.contains("audio")));
}

/// Tests that a reading passage is generated for the requested grade.
#[tokio::test]
async fn test_generate_passage() {
    let local = MockServer::start_async().await;
    mock_local_model(&local, "Ravi has a red kite.").await;
    let base = spawn_gateway(&local).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/assessment/generate-text"))
        .json(&json!({ "gradeLevel": "2", "language": "en", "difficulty": "easy" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Response was not JSON");

    assert_eq!(body["text"], "Ravi has a red kite.");
    assert_eq!(body["gradeLevel"], "2");
}
