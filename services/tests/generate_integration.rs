mod common;

use axum::body::Bytes;
use axum::http::StatusCode;
use common::{
    BOTTOM_BYTES, Harness, IMAGE_MODEL_PATH, TOP_BYTES, USER_PHOTO_BYTES, b64, image_reply,
    mount_model_reply, text_reply,
};
use outfits_services::config::ProxyAuth;
use outfits_services::nano_banana::GenerateResponse;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn missing_user_photo_is_400() {
    let harness = Harness::new().await;

    for body in [json!({}), json!({ "user_photo": "   " })] {
        let response = harness
            .server
            .post("/api/nano-banana/generate")
            .json(&body)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "user_photo is required" }));
    }

    assert!(harness.model_requests().await.is_empty());
}

#[tokio::test]
async fn malformed_body_is_json_error() {
    let harness = Harness::new().await;

    let response = harness
        .server
        .post("/api/nano-banana/generate")
        .content_type("application/json")
        .bytes(Bytes::from_static(b"{\"user_photo\":"))
        .expect_failure()
        .await;
    assert!(response.status_code().is_client_error());
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn user_photo_only_returns_data_url() {
    let harness = Harness::new().await;
    mount_model_reply(
        &harness.upstream,
        IMAGE_MODEL_PATH,
        image_reply("image/png", b"composite"),
    )
    .await;

    let response = harness
        .server
        .post("/api/nano-banana/generate")
        .json(&json!({ "user_photo": format!("{}?t=1700000000", harness.image_url("user.jpg")) }))
        .await;
    response.assert_status(StatusCode::OK);

    let body: GenerateResponse = response.json();
    assert!(body.generated_image_url.starts_with("data:image/"));
    assert_eq!(
        body.generated_image_url,
        format!("data:image/png;base64,{}", b64(b"composite"))
    );
    assert_eq!(body.processing_time, Some(1290));

    let requests = harness.model_requests().await;
    assert_eq!(requests.len(), 1);
    let parts = &requests[0]["contents"][0]["parts"];
    assert_eq!(
        parts[0]["text"],
        "Place this clothing naturally on the person in the image, maintaining realistic fit, shadows, and proportions"
    );
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[1]["inlineData"]["data"], b64(USER_PHOTO_BYTES));
    assert!(parts.get(2).is_none());
}

#[tokio::test]
async fn two_garments_are_sent_in_order() {
    let harness = Harness::new().await;
    mount_model_reply(
        &harness.upstream,
        IMAGE_MODEL_PATH,
        image_reply("image/jpeg", b"composite"),
    )
    .await;

    harness
        .server
        .post("/api/nano-banana/generate")
        .json(&json!({
            "user_photo": harness.image_url("user.jpg"),
            "top_image": harness.image_url("top.png"),
            "bottom_image": harness.image_url("bottom.png"),
        }))
        .await
        .assert_status(StatusCode::OK);

    let requests = harness.model_requests().await;
    let parts = &requests[0]["contents"][0]["parts"];
    assert_eq!(
        parts[0]["text"],
        "Place these clothing items naturally on the person in the image, maintaining realistic fit, shadows, and proportions."
    );
    assert_eq!(parts[1]["inlineData"]["data"], b64(USER_PHOTO_BYTES));
    assert_eq!(parts[2]["inlineData"]["data"], b64(TOP_BYTES));
    assert_eq!(parts[3]["inlineData"]["data"], b64(BOTTOM_BYTES));
    assert_eq!(parts[3]["inlineData"]["mimeType"], "image/png");
}

#[tokio::test]
async fn custom_prompt_overrides_default() {
    let harness = Harness::new().await;
    mount_model_reply(
        &harness.upstream,
        IMAGE_MODEL_PATH,
        image_reply("image/png", b"composite"),
    )
    .await;

    harness
        .server
        .post("/api/nano-banana/generate")
        .json(&json!({
            "user_photo": harness.image_url("user.jpg"),
            "top_image": harness.image_url("top.png"),
            "prompt": "Make it look like a studio shot",
        }))
        .await
        .assert_status(StatusCode::OK);

    let requests = harness.model_requests().await;
    assert_eq!(
        requests[0]["contents"][0]["parts"][0]["text"],
        "Make it look like a studio shot"
    );
}

#[tokio::test]
async fn text_only_reply_is_500_with_text() {
    let harness = Harness::new().await;
    let refusal = "I can't generate that image. Try a different photo.";
    mount_model_reply(&harness.upstream, IMAGE_MODEL_PATH, text_reply(refusal)).await;

    let response = harness
        .server
        .post("/api/nano-banana/generate")
        .json(&json!({ "user_photo": harness.image_url("user.jpg") }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": refusal }));
}

#[tokio::test]
async fn unreachable_image_is_500() {
    let harness = Harness::new().await;
    let missing = harness.image_url("missing.jpg");

    let response = harness
        .server
        .post("/api/nano-banana/generate")
        .json(&json!({ "user_photo": missing }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": format!("Failed to fetch {missing}: 404") }));
    assert!(harness.model_requests().await.is_empty());
}

#[tokio::test]
async fn data_url_photo_skips_fetch() {
    let harness = Harness::new().await;
    mount_model_reply(
        &harness.upstream,
        IMAGE_MODEL_PATH,
        image_reply("image/png", b"composite"),
    )
    .await;

    harness
        .server
        .post("/api/nano-banana/generate")
        .json(&json!({ "user_photo": format!("data:image/png;base64,{}", b64(b"inline")) }))
        .await
        .assert_status(StatusCode::OK);

    let requests = harness.model_requests().await;
    let user_part = &requests[0]["contents"][0]["parts"][1]["inlineData"];
    assert_eq!(user_part["mimeType"], "image/png");
    assert_eq!(user_part["data"], b64(b"inline"));
}

#[tokio::test]
async fn provider_error_message_is_forwarded() {
    let harness = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(IMAGE_MODEL_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&harness.upstream)
        .await;

    let response = harness
        .server
        .post("/api/nano-banana/generate")
        .json(&json!({ "user_photo": harness.image_url("user.jpg") }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_json(&json!({ "error": "API key not valid." }));
}

#[tokio::test]
async fn api_key_is_required_when_configured() {
    let harness = Harness::with_auth(ProxyAuth::ApiKey("shared-key".to_owned())).await;
    mount_model_reply(
        &harness.upstream,
        IMAGE_MODEL_PATH,
        image_reply("image/png", b"composite"),
    )
    .await;
    let body = json!({ "user_photo": harness.image_url("user.jpg") });

    let response = harness
        .server
        .post("/api/nano-banana/generate")
        .json(&body)
        .expect_failure()
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_json(&json!({ "error": "Unauthorized" }));

    harness
        .server
        .post("/api/nano-banana/generate")
        .authorization_bearer("wrong-key")
        .json(&body)
        .expect_failure()
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    harness
        .server
        .post("/api/nano-banana/generate")
        .authorization_bearer("shared-key")
        .json(&body)
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_is_413_json() {
    use axum_test::TestServer;
    use outfits_services::{config::Config, gemini::GeminiClient, routes};

    let config = Config::new_for_test("http://127.0.0.1:9").with_body_limit(1024);
    let gemini = GeminiClient::new(reqwest::Client::new(), &config);
    let server = TestServer::new(routes(gemini, config)).expect("test server starts");

    let photo = format!("data:image/jpeg;base64,{}", "A".repeat(4096));
    let response = server
        .post("/api/nano-banana/generate")
        .json(&json!({ "user_photo": photo }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}
