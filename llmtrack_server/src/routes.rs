use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

use llmtrack_core::{Experiment, ExperimentStore};
use llmtrack_metrics::{MetricsSummary, ModelMonitor};

use crate::generation::{estimate_tokens, GenerationBackend, GenerationRequest};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<ExperimentStore>>,
    pub monitor: ModelMonitor,
    pub backend: Arc<dyn GenerationBackend>,
    pub started_at: Instant,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/metrics", get(metrics_summary))
        .route("/metrics/prometheus", get(prometheus_metrics))
        .route("/experiments", get(list_experiments))
        .route("/experiments/best", get(best_experiment))
        .route("/experiments/:id", get(get_experiment))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }

    fn upstream(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: err.to_string(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub response: String,
    pub model: String,
    pub latency: f64,
    pub timestamp: DateTime<Utc>,
    pub experiment_id: String,
}

async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let started = Instant::now();

    let parameters = HashMap::from([
        ("temperature".to_string(), json!(request.temperature)),
        ("max_tokens".to_string(), json!(request.max_tokens)),
    ]);

    let experiment_id = state
        .store
        .write()
        .await
        .create(&request.model, parameters)
        .map_err(ApiError::internal)?;

    match state.backend.generate(&request).await {
        Ok(text) => {
            let latency = started.elapsed().as_secs_f64();

            if let Err(e) = state
                .monitor
                .record_request(
                    &request.model,
                    latency,
                    request.prompt.chars().count(),
                    text.chars().count(),
                )
                .await
            {
                warn!("failed to record request metrics: {}", e);
            }

            let metrics = HashMap::from([
                ("latency".to_string(), json!(latency)),
                (
                    "input_tokens".to_string(),
                    json!(estimate_tokens(&request.prompt)),
                ),
                ("output_tokens".to_string(), json!(estimate_tokens(&text))),
                ("success".to_string(), json!(true)),
            ]);
            state
                .store
                .write()
                .await
                .log_metrics(&experiment_id, metrics)
                .map_err(ApiError::internal)?;

            Ok(Json(GenerateResponse {
                response: text,
                model: request.model,
                latency,
                timestamp: Utc::now(),
                experiment_id,
            }))
        }
        Err(e) => {
            if let Err(record_err) = state.monitor.record_error(&request.model).await {
                warn!("failed to record error metrics: {}", record_err);
            }

            let metrics = HashMap::from([
                ("success".to_string(), json!(false)),
                ("error".to_string(), json!(e.to_string())),
            ]);
            if let Err(persist_err) = state
                .store
                .write()
                .await
                .log_metrics(&experiment_id, metrics)
            {
                error!("failed to persist failure metrics: {}", persist_err);
            }

            Err(ApiError::upstream(e))
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum SummaryResponse {
    Data(MetricsSummary),
    Empty { message: String },
}

async fn metrics_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    match state.monitor.summary().await {
        Some(summary) => Json(SummaryResponse::Data(summary)),
        None => Json(SummaryResponse::Empty {
            message: "No metrics recorded yet".to_string(),
        }),
    }
}

async fn prometheus_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let text = state
        .monitor
        .export_prometheus()
        .map_err(ApiError::internal)?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

async fn list_experiments(State(state): State<AppState>) -> Json<Vec<Experiment>> {
    let store = state.store.read().await;
    Json(store.list_all().into_iter().cloned().collect())
}

async fn get_experiment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Experiment>, ApiError> {
    let store = state.store.read().await;
    store
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Experiment '{}' not found", id)))
}

#[derive(Debug, Deserialize)]
struct BestQuery {
    #[serde(default = "default_best_metric")]
    metric: String,
    #[serde(default = "default_minimize")]
    minimize: bool,
}

fn default_best_metric() -> String {
    "latency".to_string()
}

fn default_minimize() -> bool {
    true
}

async fn best_experiment(
    State(state): State<AppState>,
    Query(query): Query<BestQuery>,
) -> Result<Json<Experiment>, ApiError> {
    let store = state.store.read().await;
    store
        .best(&query.metric, query.minimize)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found(format!(
                "No completed experiment has metric '{}'",
                query.metric
            ))
        })
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    upstream: String,
    experiments: usize,
    uptime_seconds: u64,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let upstream_ok = state.backend.healthy().await;
    let experiments = state.store.read().await.len();

    Json(HealthResponse {
        status: if upstream_ok { "healthy" } else { "degraded" }.to_string(),
        upstream: if upstream_ok {
            "connected"
        } else {
            "disconnected"
        }
        .to_string(),
        experiments,
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
