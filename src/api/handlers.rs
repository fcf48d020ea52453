//! API request handlers

use crate::error::{GraphError, GraphResult};
use crate::ingest::{
    AdjustmentRequest, IngestManager, MealLogRequest, ProfileSyncRequest, SwipeRequest,
};
use crate::insights::{InsightAggregator, Insights};
use crate::{AppState, GraphContext};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub graph: Arc<GraphContext>,
    pub ingest: IngestManager,
    pub insights: InsightAggregator,
}

/// Shared router state
pub type ApiState = Arc<ServerState>;

impl ServerState {
    pub fn new(app: AppState) -> Self {
        Self {
            ingest: IngestManager::new(app.graph.clone()),
            insights: InsightAggregator::new(app.graph.clone()),
            graph: app.graph,
        }
    }
}

// ============================================================================
// Response envelopes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub ok: bool,
    pub data: T,
}

// ============================================================================
// Health check
// ============================================================================

/// Liveness response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Process liveness; does not touch the graph backend.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphHealthResponse {
    pub ok: bool,
    pub backend_configured: bool,
    pub schema_ready: bool,
}

/// GET /api/graph/health: always answered, never passes the readiness gate.
pub async fn graph_health(State(state): State<ApiState>) -> Json<GraphHealthResponse> {
    Json(GraphHealthResponse {
        ok: true,
        backend_configured: state.graph.is_configured(),
        schema_ready: state.graph.schema_ready(),
    })
}

// ============================================================================
// Ingestion
// ============================================================================

/// Decode a JSON body, reporting malformed input as a validation failure
fn parse_body<T: DeserializeOwned>(
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}

/// Run an ingestor on its own task so a dropped connection cannot cancel the write.
async fn spawn_ingest<F>(task: F) -> Result<Json<OkResponse>, AppError>
where
    F: Future<Output = GraphResult<()>> + Send + 'static,
{
    tokio::spawn(task)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Ingest task failed: {}", e)))??;
    Ok(OkResponse::ok())
}

/// POST /api/graph/profile-sync
pub async fn sync_profile(
    State(state): State<ApiState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let req: ProfileSyncRequest = parse_body(body)?;
    spawn_ingest(async move { state.ingest.sync_profile(req).await }).await
}

/// POST /api/graph/swipe
pub async fn record_swipe(
    State(state): State<ApiState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let req: SwipeRequest = parse_body(body)?;
    spawn_ingest(async move { state.ingest.record_swipe(req).await }).await
}

/// POST /api/graph/adjustment
pub async fn record_adjustment(
    State(state): State<ApiState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let req: AdjustmentRequest = parse_body(body)?;
    spawn_ingest(async move { state.ingest.record_adjustment(req).await }).await
}

/// POST /api/graph/meal-log
pub async fn record_meal_log(
    State(state): State<ApiState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let req: MealLogRequest = parse_body(body)?;
    spawn_ingest(async move { state.ingest.record_meal_log(req).await }).await
}

// ============================================================================
// Insights
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsQuery {
    pub user_id: Option<String>,
}

/// GET /api/graph/insights?userId=
pub async fn get_insights(
    State(state): State<ApiState>,
    query: Result<Query<InsightsQuery>, QueryRejection>,
) -> Result<Json<DataResponse<Insights>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let user_id = query.user_id.unwrap_or_default();
    let data = state.insights.get_insights(&user_id).await?;
    Ok(Json(DataResponse { ok: true, data }))
}

// ============================================================================
// Error handling
// ============================================================================

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Graph(GraphError),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Graph(GraphError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg),
            AppError::Graph(e) if e.is_unavailable() => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            // Transport detail was logged where it happened
            AppError::Graph(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(serde_json::json!({
            "ok": false,
            "message": message
        }));

        (status, body).into_response()
    }
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        AppError::Graph(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}
