// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Route definitions.

use crate::handlers;
use crate::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/readings/since/:timestamp", get(handlers::since))
        .route("/readings/latest", get(handlers::latest))
        .route("/poll", get(handlers::poll))
        .route("/health", get(handlers::health))
        // Legacy routes (older dashboard scripts)
        .route("/get_recent/:timestamp", get(handlers::since))
        .route("/get_last", get(handlers::latest))
        .route("/poll_sensors", get(handlers::poll))
}
