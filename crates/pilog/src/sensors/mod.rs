// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Sensor adapters
//!
//! One adapter per sensor family. An adapter takes one sample through the
//! [`Hardware`] layer and maps it into a [`Measurement`]:
//!
//! - a failed or empty read yields `None`, never an error
//! - only the fields owned by the family are filled
//! - the timestamp is captured once per poll
//!
//! Constructing an adapter probes the hardware; that is the only place a
//! [`SensorInitError`] can come from. Supporting a new family means adding
//! one adapter module and one [`Adapter`] variant.

pub mod analog;
pub mod bme680;
pub mod dht22;

pub use analog::AnalogAdcAdapter;
pub use bme680::Bme680Adapter;
pub use dht22::Dht22Adapter;

use crate::error::SensorInitError;
use crate::hardware::Hardware;
use crate::reading::{Measurement, SensorType};
use std::sync::Arc;
use std::time::Duration;

/// Tunables applied when adapters are constructed.
#[derive(Debug, Clone, Copy)]
pub struct AdapterOptions {
    /// Read attempts per DHT22 poll (the single-wire protocol drops frames).
    pub dht22_attempts: u32,
    /// Pause between DHT22 attempts; the sensor needs ~2 s between reads.
    pub dht22_retry_delay: Duration,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            dht22_attempts: 3,
            dht22_retry_delay: Duration::from_secs(2),
        }
    }
}

/// A constructed adapter for one sensor family.
pub enum Adapter {
    Dht22(Dht22Adapter),
    Bme680(Bme680Adapter),
    AnalogAdc(AnalogAdcAdapter),
}

impl Adapter {
    /// Probe the hardware and build the adapter for `sensor_type`.
    pub fn connect(
        sensor_type: SensorType,
        hardware: Arc<dyn Hardware>,
        options: &AdapterOptions,
    ) -> Result<Self, SensorInitError> {
        tracing::info!("Setting up {} sensor", sensor_type);
        hardware.probe(sensor_type)?;

        Ok(match sensor_type {
            SensorType::Dht22 => Self::Dht22(
                Dht22Adapter::new(hardware)
                    .with_retry(options.dht22_attempts, options.dht22_retry_delay),
            ),
            SensorType::Bme680 => Self::Bme680(Bme680Adapter::new(hardware)),
            SensorType::AnalogAdc => Self::AnalogAdc(AnalogAdcAdapter::new(hardware)),
        })
    }

    pub fn sensor_type(&self) -> SensorType {
        match self {
            Self::Dht22(_) => SensorType::Dht22,
            Self::Bme680(_) => SensorType::Bme680,
            Self::AnalogAdc(_) => SensorType::AnalogAdc,
        }
    }

    /// Take one reading on `channel`. `None` means the read failed.
    pub fn poll(&self, channel: u32) -> Option<Measurement> {
        match self {
            Self::Dht22(adapter) => adapter.poll(channel),
            Self::Bme680(adapter) => adapter.poll(channel),
            Self::AnalogAdc(adapter) => adapter.poll(channel),
        }
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Adapter").field(&self.sensor_type()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimulatedHardware;

    #[test]
    fn test_connect_each_type() {
        let hw: Arc<dyn Hardware> = Arc::new(SimulatedHardware::new());
        for kind in SensorType::ALL {
            let adapter = Adapter::connect(kind, Arc::clone(&hw), &AdapterOptions::default())
                .unwrap();
            assert_eq!(adapter.sensor_type(), kind);

            let measurement = adapter.poll(0).unwrap();
            assert_eq!(measurement.sensor_type, kind);
        }
    }

    #[test]
    fn test_connect_absent_device() {
        let hw: Arc<dyn Hardware> =
            Arc::new(SimulatedHardware::new().without(SensorType::Bme680));
        let err = Adapter::connect(SensorType::Bme680, hw, &AdapterOptions::default())
            .unwrap_err();
        assert_eq!(err.sensor_type(), SensorType::Bme680);
    }
}
