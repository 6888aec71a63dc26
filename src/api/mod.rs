use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{TripError, models::AggregatedResult, orchestrator::Orchestrator};

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

impl From<&TripError> for ApiError {
    fn from(err: &TripError) -> Self {
        Self {
            error: err.code().to_string(),
            message: err.user_message(),
        }
    }
}

/// Maps planning failures onto HTTP statuses
pub struct PlanError(TripError);

impl IntoResponse for PlanError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TripError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            TripError::PlaceNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ApiError::from(&self.0))).into_response()
    }
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new()
        .route("/plan", get(get_plan))
        .route("/health", get(health))
        .with_state(orchestrator)
}

async fn get_plan(
    State(orchestrator): State<Arc<Orchestrator>>,
    Query(params): Query<PlanQuery>,
) -> Result<Json<AggregatedResult>, PlanError> {
    orchestrator.plan(&params.q).await.map(Json).map_err(PlanError)
}

async fn health() -> &'static str {
    "ok"
}
