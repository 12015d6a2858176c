// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! DHT22 humidity/temperature adapter.

use crate::hardware::Hardware;
use crate::reading::{capture_time, Measurement, SensorType};
use std::sync::Arc;
use std::time::Duration;

/// DHT22 adapter with bounded retry.
pub struct Dht22Adapter {
    hardware: Arc<dyn Hardware>,
    attempts: u32,
    retry_delay: Duration,
}

impl Dht22Adapter {
    pub fn new(hardware: Arc<dyn Hardware>) -> Self {
        Self {
            hardware,
            attempts: 1,
            retry_delay: Duration::ZERO,
        }
    }

    /// Retry failed reads up to `attempts` times in total.
    pub fn with_retry(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    pub fn poll(&self, pin: u32) -> Option<Measurement> {
        let timestamp = capture_time();
        tracing::info!(sensor_type = "dht22", pin, "Polling DHT22 sensor");

        for attempt in 1..=self.attempts {
            match self.hardware.read_dht22(pin) {
                Ok(sample) if sample.temperature.is_some() || sample.humidity.is_some() => {
                    let mut measurement = Measurement::new(SensorType::Dht22, timestamp);
                    measurement.temperature = sample.temperature;
                    measurement.humidity = sample.humidity;
                    return Some(measurement);
                }
                Ok(_) => tracing::debug!(pin, attempt, "DHT22 returned no data"),
                Err(e) => tracing::debug!(pin, attempt, "DHT22 read failed: {}", e),
            }

            if attempt < self.attempts && !self.retry_delay.is_zero() {
                std::thread::sleep(self.retry_delay);
            }
        }

        tracing::info!(pin, "Failed to retrieve data from DHT22 sensor");
        None
    }
}
