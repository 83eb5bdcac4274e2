mod rate_limit;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Path as AxumPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use beacon_agents::{CrisisCoordinator, DEFAULT_COUNTRY};
use beacon_classifier::CrisisClassifier;
use beacon_observability::{AppMetrics, MetricsSnapshot};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::rate_limit::IpRateLimiter;

const MAX_BODY_BYTES: usize = 64 * 1024;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
const RATE_LIMIT_MAX_REQUESTS: usize = 30;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub data_root: PathBuf,
    pub cases_file: PathBuf,
    pub api_key: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            data_root: env::var("BEACON_DATA_ROOT")
                .unwrap_or_else(|_| "data".to_string())
                .into(),
            cases_file: env::var("BEACON_CASES_FILE")
                .unwrap_or_else(|_| "cases.json".to_string())
                .into(),
            api_key: env::var("BEACON_API_KEY").unwrap_or_else(|_| "dev-beacon-key".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub agent: Arc<CrisisCoordinator>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
}

#[derive(Debug, serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    capabilities: beacon_agents::HealthStatus,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Deserialize)]
struct DetectRequest {
    crisis_description: String,
    #[serde(default)]
    country: Option<String>,
}

pub async fn build_app(config: ApiConfig) -> Result<Router> {
    let metrics = AppMetrics::shared();
    let classifier = CrisisClassifier::from_env();
    let agent = Arc::new(CrisisCoordinator::bootstrap(
        &config.data_root,
        &config.cases_file,
        classifier,
        metrics.clone(),
    )?);

    let state = ApiState {
        agent,
        metrics,
        api_key: config.api_key,
        limiter: IpRateLimiter::new(RATE_LIMIT_WINDOW, RATE_LIMIT_MAX_REQUESTS),
    };

    let protected = Router::new()
        .route("/v1/detect", post(detect))
        .route("/v1/cases", get(list_cases))
        .route("/v1/cases/:case_id", get(get_case))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let app = Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state);

    Ok(app)
}

async fn require_api_key(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let client = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("local")
        .to_string();

    if !state.limiter.allow(&client) {
        return error_response(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded");
    }

    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    if provided != Some(state.api_key.as_str()) {
        return error_response(StatusCode::UNAUTHORIZED, "missing or invalid api key");
    }

    next.run(request).await
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp_utc: Utc::now().to_rfc3339(),
        capabilities: state.agent.health(),
        metrics: state.metrics.snapshot(),
    })
}

async fn detect(
    State(state): State<ApiState>,
    Json(request): Json<DetectRequest>,
) -> impl IntoResponse {
    let country = request.country.as_deref().unwrap_or(DEFAULT_COUNTRY);
    let outcome = state
        .agent
        .handle_report(&request.crisis_description, country)
        .await;

    Json(json!({
        "success": true,
        "case_id": outcome.case_id,
        "classification": outcome.classification,
        "response": outcome.response_text,
        "fallback_used": outcome.fallback_used,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn list_cases(State(state): State<ApiState>) -> impl IntoResponse {
    let cases = state.agent.list_cases();
    Json(json!({
        "success": true,
        "total_cases": cases.len(),
        "cases": cases,
    }))
}

async fn get_case(
    State(state): State<ApiState>,
    AxumPath(case_id): AxumPath<String>,
) -> Response {
    match state.agent.get_case(&case_id) {
        Some(case) => Json(json!({ "success": true, "case": case })).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("Case {case_id} not found"),
        ),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}
