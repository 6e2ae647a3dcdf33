use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};

use crate::druid::DruidBackend;
use crate::error::AqsError;
use crate::history::{
    ApiResponse, DigestType, MetricsQueryBuilder, PreparedQuery, RevisionMetric, TimeseriesRequest,
    TopRequest, TopType,
};

/// Responses of the history endpoints are cached for a day.
pub const CACHE_CONTROL: &str = "s-maxage=86400, max-age=86400";

pub struct AppState {
    pub backend: Arc<dyn DruidBackend>,
    pub builder: MetricsQueryBuilder,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

impl IntoResponse for AqsError {
    fn into_response(self) -> Response {
        let status = match &self {
            AqsError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AqsError::NotFound(_) => StatusCode::NOT_FOUND,
            AqsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AqsError::Backend(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let detail = match &self {
            AqsError::InvalidRequest(messages) => json!(messages),
            AqsError::NotFound(message) | AqsError::Internal(message) => json!(message),
            AqsError::Backend(e) => json!(format!("{e:#}")),
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, "request rejected");
        }

        (status, Json(json!({ "type": self.error_type(), "detail": detail }))).into_response()
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = (status, Json(self.body)).into_response();
        if status == StatusCode::OK {
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
        }
        response
    }
}

async fn run(state: &AppState, query: PreparedQuery) -> Result<ApiResponse, AqsError> {
    query.execute(state.backend.as_ref()).await
}

pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}

pub async fn new_pages(
    State(state): State<Arc<AppState>>,
    Path(req): Path<TimeseriesRequest>,
) -> Result<ApiResponse, AqsError> {
    let query = state.builder.new_pages(&req)?;
    run(&state, query).await
}

pub async fn newly_registered_users(
    State(state): State<Arc<AppState>>,
    Path(req): Path<TimeseriesRequest>,
) -> Result<ApiResponse, AqsError> {
    let query = state.builder.newly_registered_users(&req)?;
    run(&state, query).await
}

pub async fn digests(
    state: Arc<AppState>,
    digest: DigestType,
    req: TimeseriesRequest,
) -> Result<ApiResponse, AqsError> {
    let query = state.builder.digests(digest, &req)?;
    run(&state, query).await
}

pub async fn revisions(
    state: Arc<AppState>,
    metric: RevisionMetric,
    req: TimeseriesRequest,
) -> Result<ApiResponse, AqsError> {
    let query = state.builder.revisions(metric, &req)?;
    run(&state, query).await
}

pub async fn revisions_top(
    state: Arc<AppState>,
    top: TopType,
    metric: RevisionMetric,
    req: TopRequest,
) -> Result<ApiResponse, AqsError> {
    let query = state.builder.revisions_top(top, metric, &req)?;
    run(&state, query).await
}

