use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};

use super::AppState;
use super::error::ApiError;
use crate::consts::VERSION;
use crate::engine::Invocation;
use crate::files::ReadError;
use crate::llm::FunctionSpec;

#[derive(Debug, Deserialize)]
pub struct RunParams {
    pub task: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadParams {
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub functions: usize,
}

/// `POST /run?task=...`
pub async fn run_task(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RunParams>,
) -> Result<Json<Invocation>, ApiError> {
    let invocation = state.engine.run(&params.task).await?;
    Ok(Json(invocation))
}

/// `GET /read?path=...`, answered as `text/plain`.
pub async fn read_file(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReadParams>,
) -> Result<String, ApiError> {
    state.files.read(&params.path).await.map_err(|e| {
        match &e {
            ReadError::NotFound(path) => warn!(path = %path.display(), "file not found"),
            ReadError::Forbidden(path) => warn!(path = %path.display(), "read outside root refused"),
            ReadError::Io(io) => {
                error!(path = %params.path.display(), error = %io, "read failed")
            }
        }
        ApiError::from(e)
    })
}

/// `GET /functions`: the manifest the model is offered.
pub async fn list_functions(State(state): State<Arc<AppState>>) -> Json<Vec<FunctionSpec>> {
    Json(state.tools.manifest())
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
        functions: state.tools.len(),
    })
}
