use super::*;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode as AxumStatus,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::domain::{ImageSlot, MeasurementField, Measurements, StylePreference, TryOnStatus};
use shared::error::ValidationError;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct FakeBackend {
    status: AxumStatus,
    body: serde_json::Value,
    captured: Arc<Mutex<Option<oneshot::Sender<TryOnRequest>>>>,
}

async fn handle_generate(
    State(state): State<FakeBackend>,
    Json(payload): Json<TryOnRequest>,
) -> impl IntoResponse {
    if let Some(tx) = state.captured.lock().await.take() {
        let _ = tx.send(payload);
    }
    (state.status, Json(state.body.clone()))
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "message": "Virtual Try-On API is running!" }))
}

fn record_json(id: &str) -> serde_json::Value {
    record_json_at(id, "2024-05-01T12:00:00Z")
}

fn record_json_at(id: &str, created_at: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Ada",
        "tryon_image": "https://cdn.example.com/out.png",
        "measurements": { "height": "170", "weight": "65", "chest": "90", "waist": "75", "hips": "95" },
        "style": "casual",
        "feedback": "Virtual try-on generated successfully for casual style!",
        "created_at": created_at,
        "status": "completed"
    })
}

async fn handle_record(Path(id): Path<String>) -> impl IntoResponse {
    if id == "known" {
        (AxumStatus::OK, Json(record_json("known")))
    } else {
        (
            AxumStatus::NOT_FOUND,
            Json(json!({ "detail": "Try-on result not found" })),
        )
    }
}

async fn handle_record_image(Path(id): Path<String>) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "image_base64": "data:image/png;base64,AQID", "id": id }))
}

async fn handle_list() -> Json<serde_json::Value> {
    Json(json!([
        record_json("newest"),
        record_json_at("older", "2024-04-30T09:15:00.250000"),
    ]))
}

async fn handle_hosted_image() -> impl IntoResponse {
    (AxumStatus::OK, vec![9u8, 8, 7])
}

async fn spawn_backend(
    status: AxumStatus,
    body: serde_json::Value,
) -> (String, oneshot::Receiver<TryOnRequest>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel();
    let state = FakeBackend {
        status,
        body,
        captured: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route("/api/", get(handle_health))
        .route("/api/tryon/generate", post(handle_generate))
        .route("/api/tryon/:id", get(handle_record))
        .route("/api/tryon/:id/base64", get(handle_record_image))
        .route("/api/tryons", get(handle_list))
        .route("/files/out.png", get(handle_hosted_image))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), rx)
}

fn client_for(url: &str) -> TryOnClient {
    let settings = ClientSettings::default()
        .with_backend_url(url)
        .expect("settings");
    TryOnClient::new(settings).expect("client")
}

fn complete_form() -> FormData {
    FormData {
        user_image: Some(DataUrl::from_bytes("image/jpeg", b"me")),
        clothing_image: Some(DataUrl::from_bytes("image/png", b"jacket")),
        name: "Ada".into(),
        measurements: Measurements {
            height: "170".into(),
            weight: "65".into(),
            chest: "90".into(),
            waist: "75".into(),
            hips: "95".into(),
        },
        style: StylePreference::Sporty,
    }
}

#[test]
fn non_success_status_uses_detail_field() {
    let err = interpret_generate_response(StatusCode::BAD_REQUEST, br#"{"detail":"bad input"}"#)
        .expect_err("400");
    assert_eq!(
        err,
        TryOnError::Http {
            status: 400,
            message: "bad input".into()
        }
    );
}

#[test]
fn non_success_status_without_json_falls_back_to_generic_message() {
    let err = interpret_generate_response(StatusCode::BAD_GATEWAY, b"<html>upstream</html>")
        .expect_err("502");
    assert_eq!(err.to_string(), "HTTP error! status: 502");
}

#[test]
fn success_false_is_an_application_error() {
    let err = interpret_generate_response(
        StatusCode::OK,
        br#"{"success":false,"error":"No images generated by FAL.AI"}"#,
    )
    .expect_err("app error");
    assert_eq!(
        err,
        TryOnError::Application("No images generated by FAL.AI".into())
    );

    let err = interpret_generate_response(StatusCode::OK, br#"{"success":false}"#)
        .expect_err("app error");
    assert_eq!(err.to_string(), shared::error::GENERIC_APPLICATION_ERROR);
}

#[test]
fn unreadable_success_body_is_a_decode_error() {
    let err = interpret_generate_response(StatusCode::OK, b"not json").expect_err("decode");
    assert_eq!(err.kind(), shared::error::ErrorKind::Decode);
}

#[tokio::test]
async fn generate_posts_form_as_json_and_returns_result() {
    let (url, captured) = spawn_backend(
        AxumStatus::OK,
        json!({
            "success": true,
            "id": "abc-123",
            "tryon_image": "X",
            "feedback": "Y",
            "status": "completed"
        }),
    )
    .await;
    let client = client_for(&url);

    let result = client
        .generate_try_on(&complete_form())
        .await
        .expect("generate");
    assert!(result.success);
    assert_eq!(result.id, Some(TryOnId("abc-123".into())));
    assert_eq!(result.result_image.as_deref(), Some("X"));
    assert_eq!(result.feedback.as_deref(), Some("Y"));
    assert_eq!(result.status, Some(TryOnStatus::Completed));

    let sent = captured.await.expect("request captured");
    assert_eq!(sent.name, "Ada");
    assert_eq!(sent.style, StylePreference::Sporty);
    assert_eq!(sent.measurements.get(MeasurementField::Waist), "75");
    assert!(sent.user_image.starts_with("data:image/jpeg;base64,"));
    assert!(sent.clothing_image.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn http_400_detail_is_surfaced() {
    let (url, _captured) =
        spawn_backend(AxumStatus::BAD_REQUEST, json!({ "detail": "bad input" })).await;
    let err = client_for(&url)
        .generate_try_on(&complete_form())
        .await
        .expect_err("400");
    assert!(err.to_string().contains("bad input"));
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn http_500_with_detail_reports_server_message() {
    let (url, _captured) = spawn_backend(
        AxumStatus::INTERNAL_SERVER_ERROR,
        json!({ "detail": "Failed to generate try-on: quota exceeded" }),
    )
    .await;
    let err = client_for(&url)
        .generate_try_on(&complete_form())
        .await
        .expect_err("500");
    assert_eq!(err.to_string(), "Failed to generate try-on: quota exceeded");
}

#[tokio::test]
async fn invalid_form_is_rejected_without_a_request() {
    let (url, captured) = spawn_backend(AxumStatus::OK, json!({ "success": true })).await;
    let mut form = complete_form();
    form.clothing_image = None;

    let err = client_for(&url)
        .generate_try_on(&form)
        .await
        .expect_err("invalid");
    assert_eq!(
        err,
        TryOnError::Validation(ValidationError::MissingImage(ImageSlot::Clothing))
    );

    let not_sent = tokio::time::timeout(std::time::Duration::from_millis(200), captured).await;
    assert!(not_sent.is_err(), "backend must not have been called");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client_for(&format!("http://{addr}"))
        .generate_try_on(&complete_form())
        .await
        .expect_err("refused");
    assert_eq!(err.kind(), shared::error::ErrorKind::Network);
}

#[tokio::test]
async fn health_returns_backend_message() {
    let (url, _captured) = spawn_backend(AxumStatus::OK, json!({})).await;
    let message = client_for(&url).health().await.expect("health");
    assert_eq!(message, "Virtual Try-On API is running!");
}

#[tokio::test]
async fn fetches_records_by_id_and_lists_history() {
    let (url, _captured) = spawn_backend(AxumStatus::OK, json!({})).await;
    let client = client_for(&url);

    let record = client
        .fetch_result(&TryOnId("known".into()))
        .await
        .expect("record");
    assert_eq!(record.status, TryOnStatus::Completed);
    assert_eq!(record.style, "casual");

    let err = client
        .fetch_result(&TryOnId("missing".into()))
        .await
        .expect_err("404");
    assert!(err.to_string().contains("not found"));

    let image = client
        .fetch_result_image(&TryOnId("known".into()))
        .await
        .expect("image");
    assert!(image.starts_with("data:image/png;base64,"));

    let history = client.list_results().await.expect("list");
    let ids: Vec<_> = history.iter().map(|r| r.id.0.as_str()).collect();
    assert_eq!(ids, ["newest", "older"]);
    assert_eq!(
        history[1].created_at.to_rfc3339(),
        "2024-04-30T09:15:00.250+00:00"
    );
}

#[tokio::test]
async fn result_image_bytes_handles_inline_and_hosted_images() {
    let (url, _captured) = spawn_backend(AxumStatus::OK, json!({})).await;
    let client = client_for(&url);

    let inline = client
        .result_image_bytes("data:image/png;base64,AQID")
        .await
        .expect("inline");
    assert_eq!(inline, vec![1, 2, 3]);

    let hosted = client
        .result_image_bytes(&format!("{url}/files/out.png"))
        .await
        .expect("hosted");
    assert_eq!(hosted, vec![9, 8, 7]);

    assert!(client.result_image_bytes("ftp://nope").await.is_err());
}
