// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! BME680 gas/temperature/humidity/pressure adapter.

use crate::hardware::Hardware;
use crate::reading::{capture_time, Measurement, SensorType};
use std::sync::Arc;

pub struct Bme680Adapter {
    hardware: Arc<dyn Hardware>,
}

impl Bme680Adapter {
    pub fn new(hardware: Arc<dyn Hardware>) -> Self {
        Self { hardware }
    }

    /// Gas resistance is kept only when the heater was stable; the rest of
    /// the sample is still a valid reading without it.
    pub fn poll(&self, channel: u32) -> Option<Measurement> {
        let timestamp = capture_time();
        tracing::info!(sensor_type = "bme680", channel, "Polling BME680 sensor");

        match self.hardware.read_bme680(channel) {
            Ok(sample) => {
                let mut measurement = Measurement::new(SensorType::Bme680, timestamp);
                measurement.temperature = Some(sample.temperature);
                measurement.humidity = Some(sample.humidity);
                measurement.pressure = Some(sample.pressure);
                if sample.heat_stable {
                    measurement.gas_resistance = Some(sample.gas_resistance);
                } else {
                    tracing::debug!(channel, "BME680 heater not stable, dropping gas reading");
                }
                Some(measurement)
            }
            Err(e) => {
                tracing::info!(channel, "Failed to retrieve data from BME680 sensor: {}", e);
                None
            }
        }
    }
}
