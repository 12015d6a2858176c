// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! pilog HTTP gateway
//!
//! Read-only JSON access to the reading store, plus an on-demand poll.
//!
//! # Endpoints
//!
//! - `GET /readings/since/:timestamp` - Readings newer than a timestamp
//! - `GET /readings/latest` - Most recent reading
//! - `GET /poll` - Run one poll cycle (204 No Content)
//! - `GET /health` - Liveness and store size
//!
//! `/get_recent/:timestamp`, `/get_last` and `/poll_sensors` are kept as
//! aliases for older clients.

pub mod handlers;
pub mod routes;

use axum::Router;
use pilog::{manifest, ConfigError, Poller, QueryFacade, SensorManifest, SqliteStore};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state
pub struct AppState {
    pub(crate) store: Arc<SqliteStore>,
    pub(crate) facade: QueryFacade<SqliteStore>,
    pub(crate) poller: Option<Arc<Poller<SqliteStore>>>,
}

impl AppState {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self {
            facade: QueryFacade::new(Arc::clone(&store)),
            store,
            poller: None,
        }
    }

    /// Enable `GET /poll` with this poller.
    pub fn with_poller(mut self, poller: Arc<Poller<SqliteStore>>) -> Self {
        self.poller = Some(poller);
        self
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Load the sensor manifest for the gateway's poller.
///
/// A missing manifest only disables `GET /poll` when the gateway is not
/// also polling on an interval. Any other manifest error is returned.
pub fn load_manifest(
    device_name: &str,
    path: &Path,
    interval_polling: bool,
) -> Result<Option<SensorManifest>, ConfigError> {
    match manifest::load(device_name, path) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(ConfigError::Io { path, source })
            if !interval_polling && source.kind() == ErrorKind::NotFound =>
        {
            tracing::warn!("No manifest at {}, polling disabled", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_manifest_is_query_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger_config.csv");
        assert!(load_manifest("pi1", &path, false).unwrap().is_none());
    }

    #[test]
    fn test_missing_manifest_with_interval_polling_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger_config.csv");
        assert!(matches!(
            load_manifest("pi1", &path, true),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_corrupt_manifest_fails_even_without_polling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger_config.csv");
        std::fs::write(&path, "location,name,type,pin\nkitchen,pi1,dht22\n").unwrap();

        assert!(matches!(
            load_manifest("pi1", &path, false),
            Err(ConfigError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_manifest_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logger_config.csv");
        std::fs::write(&path, "location,name,type,pin\nkitchen,pi1,dht22,4\n").unwrap();

        let manifest = load_manifest("pi1", &path, true).unwrap().unwrap();
        assert_eq!(manifest.len(), 1);
    }
}
