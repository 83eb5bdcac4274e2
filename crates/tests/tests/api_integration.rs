use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use beacon_api::{build_app, ApiConfig};
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

const API_KEY: &str = "dev-beacon-key";

async fn test_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let config = ApiConfig {
        data_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data"),
        cases_file: dir.path().join("cases.json"),
        api_key: API_KEY.to_string(),
    };
    let app = build_app(config).await.expect("app should build");
    (app, dir)
}

async fn parse_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _dir) = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = parse_body(response).await;
    assert_eq!(parsed["status"], "healthy");
    assert!(parsed["capabilities"]["protocols_loaded"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn detect_requires_api_key() {
    let (app, _dir) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/detect")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "crisis_description": "chest pain"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let parsed = parse_body(response).await;
    assert_eq!(parsed["success"], false);
}

#[tokio::test]
async fn detect_returns_structured_payload() {
    let (app, _dir) = test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/detect")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(
            json!({
                "crisis_description": "My father is having severe chest pain and difficulty breathing",
                "country": "USA"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = parse_body(response).await;
    assert_eq!(parsed["success"], true);
    assert_eq!(parsed["case_id"], "CASE-00001");
    assert_eq!(parsed["classification"]["category"], "medical_emergency");
    assert_eq!(parsed["classification"]["severity"], "critical");
    assert_eq!(parsed["fallback_used"], true);
    assert!(parsed["response"]
        .as_str()
        .unwrap()
        .contains("MEDICAL EMERGENCY DETECTED"));
}

#[tokio::test]
async fn cases_list_reflects_detections() {
    let (app, _dir) = test_app().await;

    let detect = Request::builder()
        .method("POST")
        .uri("/v1/detect")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(
            json!({
                "crisis_description": "Earthquake just hit, building is shaking"
            })
            .to_string(),
        ))
        .unwrap();
    let detect_response = app.clone().oneshot(detect).await.unwrap();
    assert_eq!(detect_response.status(), StatusCode::OK);

    let list = Request::builder()
        .uri("/v1/cases")
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap();
    let list_response = app.clone().oneshot(list).await.unwrap();
    assert_eq!(list_response.status(), StatusCode::OK);

    let parsed = parse_body(list_response).await;
    assert_eq!(parsed["total_cases"], 1);
    assert_eq!(parsed["cases"][0]["id"], "CASE-00001");
    assert_eq!(parsed["cases"][0]["status"], "active");

    let show = Request::builder()
        .uri("/v1/cases/CASE-00001")
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap();
    let show_response = app.oneshot(show).await.unwrap();
    assert_eq!(show_response.status(), StatusCode::OK);

    let parsed = parse_body(show_response).await;
    assert_eq!(
        parsed["case"]["classification"]["category"],
        "disaster_emergency"
    );
}

#[tokio::test]
async fn unknown_case_returns_not_found_envelope() {
    let (app, _dir) = test_app().await;

    let request = Request::builder()
        .uri("/v1/cases/CASE-99999")
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let parsed = parse_body(response).await;
    assert_eq!(parsed["success"], false);
    assert_eq!(parsed["error"], "Case CASE-99999 not found");
}
