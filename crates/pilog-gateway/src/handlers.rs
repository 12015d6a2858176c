// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! HTTP request handlers.
//!
//! Store access blocks, so every handler hops onto a blocking task.

use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pilog::{QueryError, ReadingStore, StorageError};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl ApiError {
    fn new(code: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        // Details stay in the log
        tracing::error!("Storage error: {}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable")
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::BadTimestamp(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            QueryError::Storage(e) => e.into(),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Request task failed: {}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

/// GET /readings/since/:timestamp
pub async fn since(
    State(state): State<Arc<AppState>>,
    Path(timestamp): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let response = tokio::task::spawn_blocking(move || state.facade.since(&timestamp)).await??;
    Ok(Json(response.to_json()))
}

/// GET /readings/latest
pub async fn latest(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let response = tokio::task::spawn_blocking(move || state.facade.latest()).await??;
    Ok(Json(response.to_json()))
}

/// GET /poll
pub async fn poll(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    let Some(poller) = state.poller.clone() else {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "polling is not configured",
        ));
    };

    let written = tokio::task::spawn_blocking(move || poller.run_once()).await??;
    tracing::debug!("On-demand poll wrote {} readings", written);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let polling = state.poller.is_some();
    let readings = tokio::task::spawn_blocking(move || state.store.count()).await??;

    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "readings": readings,
        "polling": polling,
    })))
}
