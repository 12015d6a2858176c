// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Poll orchestrator
//!
//! Walks the manifest once per cycle and stores one reading per sensor.
//!
//! # Operation
//!
//! 1. Build one adapter per sensor type present in the manifest
//! 2. For every configured location, poll the adapter on its channel
//! 3. Attach device identity and location to each successful measurement
//! 4. Append it to the store
//!
//! Failures are isolated by scope: a failed read skips one location, a
//! failed adapter setup disables one sensor type for the process lifetime,
//! and a storage error aborts the current cycle only.

use crate::device::DeviceIdentity;
use crate::error::{SensorInitError, StorageError};
use crate::hardware::Hardware;
use crate::manifest::SensorManifest;
use crate::reading::{Reading, SensorType};
use crate::sensors::{Adapter, AdapterOptions};
use crate::store::ReadingStore;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Poller statistics, accumulated across cycles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollStats {
    /// Cycles started
    pub cycles: u64,
    /// Adapter invocations
    pub attempts: u64,
    /// Readings stored
    pub written: u64,
    /// Reads that produced no measurement
    pub failed_reads: u64,
    /// Cycles aborted by a storage error
    pub storage_errors: u64,
}

/// Poll orchestrator for one device.
pub struct Poller<S: ReadingStore> {
    store: Arc<S>,
    identity: DeviceIdentity,
    manifest: SensorManifest,
    adapters: BTreeMap<SensorType, Adapter>,
    disabled: BTreeMap<SensorType, SensorInitError>,
    /// Serialises cycles; sensors on a shared bus cannot be read twice at once
    cycle: Mutex<()>,
    stats: Mutex<PollStats>,
}

impl<S: ReadingStore> Poller<S> {
    /// Create a poller and set up one adapter per configured sensor type.
    ///
    /// A sensor type whose adapter fails to initialise is disabled and
    /// logged; the other types are unaffected.
    pub fn new(
        manifest: SensorManifest,
        hardware: Arc<dyn Hardware>,
        options: &AdapterOptions,
        identity: DeviceIdentity,
        store: Arc<S>,
    ) -> Self {
        let mut adapters = BTreeMap::new();
        let mut disabled = BTreeMap::new();

        for sensor_type in manifest.sensor_types() {
            match Adapter::connect(sensor_type, Arc::clone(&hardware), options) {
                Ok(adapter) => {
                    adapters.insert(sensor_type, adapter);
                }
                Err(e) => {
                    tracing::warn!("Disabling {} sensors: {}", sensor_type, e);
                    disabled.insert(sensor_type, e);
                }
            }
        }

        Self {
            store,
            identity,
            manifest,
            adapters,
            disabled,
            cycle: Mutex::new(()),
            stats: Mutex::new(PollStats::default()),
        }
    }

    /// Identity attached to every reading.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Sensor types disabled at setup, with the reason.
    pub fn disabled(&self) -> impl Iterator<Item = (SensorType, &SensorInitError)> {
        self.disabled.iter().map(|(kind, err)| (*kind, err))
    }

    /// Snapshot of the accumulated statistics.
    pub fn stats(&self) -> PollStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    fn record(&self, update: impl FnOnce(&mut PollStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }

    /// Run one poll cycle and return the number of readings written.
    ///
    /// Blocks on hardware I/O. A storage error aborts the cycle and is
    /// returned; readings written before it stay written.
    pub fn run_once(&self) -> Result<usize, StorageError> {
        let _cycle = self.cycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.record(|s| s.cycles += 1);

        tracing::info!(
            "Polling sensors connected to {} ({})",
            self.identity.device_name,
            self.identity.device_id
        );

        let mut attempted = 0;
        let mut written = 0;
        for (sensor_type, adapter) in &self.adapters {
            for entry in self.manifest.entries(*sensor_type) {
                attempted += 1;
                self.record(|s| s.attempts += 1);

                let Some(measurement) = adapter.poll(entry.channel) else {
                    self.record(|s| s.failed_reads += 1);
                    continue;
                };

                let reading = Reading::from_measurement(measurement, &self.identity, &entry.location);
                if let Err(e) = self.store.insert(&reading) {
                    self.record(|s| s.storage_errors += 1);
                    tracing::error!(
                        sensor_type = %sensor_type,
                        location = %entry.location,
                        "Failed to store reading: {}",
                        e
                    );
                    return Err(e);
                }

                written += 1;
                self.record(|s| s.written += 1);
            }
        }

        tracing::info!(
            "Poll cycle complete: {} of {} readings written",
            written,
            attempted
        );
        Ok(written)
    }
}

impl<S: ReadingStore + 'static> Poller<S> {
    /// Poll forever with a fixed pause between cycles.
    ///
    /// The pause starts when a cycle ends, so a slow cycle delays the next
    /// one by its own duration. A failed cycle is logged and the loop goes on.
    pub async fn run_loop(self: Arc<Self>, interval: Duration) {
        self.run_cycles(interval, None).await;
    }

    /// Like [`run_loop`](Self::run_loop) but stops after `limit` cycles.
    pub async fn run_cycles(self: Arc<Self>, interval: Duration, limit: Option<u64>) {
        tracing::info!(
            "Logging sensors connected to {} every {} s",
            self.identity.device_name,
            interval.as_secs()
        );

        let mut completed = 0u64;
        loop {
            let poller = Arc::clone(&self);
            match tokio::task::spawn_blocking(move || poller.run_once()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::error!("Poll cycle aborted: {}", e),
                Err(e) => tracing::error!("Poll cycle panicked: {}", e),
            }

            completed += 1;
            if limit.is_some_and(|limit| completed >= limit) {
                return;
            }

            tokio::time::sleep(interval).await;
        }
    }
}
