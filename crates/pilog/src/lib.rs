// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! pilog
//!
//! Periodic environmental sensor logging for single-board computers.
//!
//! # Features
//!
//! - **Sensor Manifest** -- CSV file mapping device, location, sensor type and pin
//! - **Adapters** -- DHT22, BME680 and MCP3008-style analog channels
//! - **SQLite Store** -- Append-only, WAL mode, safe for concurrent readers
//! - **Query Façade** -- "since timestamp" and "latest" lookups for the HTTP gateway
//!
//! # Architecture
//!
//! ```text
//! Poller
//! +-- SensorManifest   (rows for this device, grouped by sensor type)
//! +-- Adapter          (one per configured sensor type)
//! |   +-- Hardware     (IIO sysfs or simulated)
//! +-- ReadingStore     (SQLite)
//!         ^
//! QueryFacade ---------+ (read-only, used by pilog-gateway)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pilog::{manifest, Poller, Settings, SqliteStore};
//! use std::sync::Arc;
//!
//! let settings = Settings::builder().device_name("greenhouse").build()?;
//! let manifest = manifest::load(&settings.device_name, &settings.manifest_path)?;
//! let store = Arc::new(SqliteStore::open(&settings.database_path)?);
//!
//! let poller = Poller::new(
//!     manifest,
//!     settings.hardware(),
//!     &Default::default(),
//!     settings.identity(),
//!     store,
//! );
//! poller.run_once()?;
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod hardware;
pub mod import;
pub mod manifest;
pub mod poller;
pub mod query;
pub mod reading;
pub mod sensors;
pub mod store;

pub use config::{HardwareKind, Settings, SettingsBuilder};
pub use device::DeviceIdentity;
pub use error::{ConfigError, HardwareError, SensorInitError, StorageError, StorageResult};
pub use hardware::{Hardware, IioHardware, SimulatedHardware};
pub use import::{import_legacy_csv, ImportError, ImportSummary};
pub use manifest::{SensorConfigEntry, SensorManifest};
pub use poller::{PollStats, Poller};
pub use query::{QueryError, QueryFacade, QueryResponse, NO_RESULTS_MESSAGE};
pub use reading::{Measurement, Reading, SensorType};
pub use sensors::{Adapter, AdapterOptions};
pub use store::{ReadingStore, SqliteStore};
