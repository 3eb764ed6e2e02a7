mod common;

use axum::http::StatusCode;
use common::{Harness, TEXT_MODEL_PATH, mount_model_reply, text_reply};
use outfits_services::nano_banana::SuggestResponse;
use serde_json::{Value, json};

fn suggest_body(prompt: &str) -> Value {
    json!({
        "prompt": prompt,
        "available_tags": ["casual", "summer"],
        "available_items": {
            "tops": [{"id": "t1", "tags": ["casual"]}],
            "bottoms": [{"id": "b1", "tags": ["summer"]}]
        }
    })
}

#[tokio::test]
async fn suggestion_returns_candidate_ids() {
    let harness = Harness::new().await;
    mount_model_reply(
        &harness.upstream,
        TEXT_MODEL_PATH,
        text_reply(
            r#"{"suggested_top_id":"t1","suggested_bottom_id":"b1","reasoning":"Top 1 keeps it relaxed, Bottom 1 suits the heat."}"#,
        ),
    )
    .await;

    let response = harness
        .server
        .post("/api/nano-banana/suggest")
        .json(&suggest_body(r#"Based on the vibe "beach day", suggest clothing items that match"#))
        .await;
    response.assert_status(StatusCode::OK);

    let suggestion: SuggestResponse = response.json();
    assert_eq!(suggestion.suggested_top_id, "t1");
    assert_eq!(suggestion.suggested_bottom_id, "b1");
    assert!(suggestion.reasoning.contains("Top 1"));

    let requests = harness.model_requests().await;
    assert_eq!(requests.len(), 1);
    let config = &requests[0]["generationConfig"];
    assert_eq!(config["responseMimeType"], "application/json");
    assert_eq!(config["responseSchema"]["required"][0], "suggested_top_id");
    let prompt = requests[0]["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt is text");
    assert!(prompt.contains("beach day"));
    assert!(prompt.contains("Top 1"));
}

#[tokio::test]
async fn suggestion_missing_id_is_500() {
    let harness = Harness::new().await;
    mount_model_reply(
        &harness.upstream,
        TEXT_MODEL_PATH,
        text_reply(r#"{"suggested_top_id":"t1","reasoning":"no bottom"}"#),
    )
    .await;

    let response = harness
        .server
        .post("/api/nano-banana/suggest")
        .json(&suggest_body("something cozy"))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": "Suggestion missing suggested_bottom_id" }));
}

#[tokio::test]
async fn empty_model_reply_is_500() {
    let harness = Harness::new().await;
    mount_model_reply(&harness.upstream, TEXT_MODEL_PATH, json!({ "candidates": [] })).await;

    let response = harness
        .server
        .post("/api/nano-banana/suggest")
        .json(&suggest_body("office"))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": "No JSON returned from model" }));
}

#[tokio::test]
async fn blank_prompt_is_400() {
    let harness = Harness::new().await;

    let response = harness
        .server
        .post("/api/nano-banana/suggest")
        .json(&suggest_body("  "))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "prompt is required" }));
    assert!(harness.model_requests().await.is_empty());
}

#[tokio::test]
async fn candidates_of_both_types_are_required() {
    let harness = Harness::new().await;

    let response = harness
        .server
        .post("/api/nano-banana/suggest")
        .json(&json!({
            "prompt": "anything",
            "available_tags": [],
            "available_items": { "tops": [{"id": "t1", "tags": []}], "bottoms": [] }
        }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
