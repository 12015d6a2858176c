// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Hardware access abstraction
//!
//! The polling pipeline never talks to a bus directly. It goes through the
//! [`Hardware`] trait, which exposes one blocking "read one sample" call per
//! sensor family plus a probe used when an adapter is constructed.
//!
//! # Implementations
//!
//! - [`IioHardware`] -- Linux Industrial I/O sysfs (`dht11`, `bme680`,
//!   `mcp320x` kernel drivers)
//! - [`SimulatedHardware`] -- scripted samples for tests and dry runs
//!
//! Raw samples are reported in the hardware's native units: degrees
//! Celsius, percent relative humidity, hectopascal, ohm and volts.

pub mod iio;
pub mod simulated;

pub use iio::IioHardware;
pub use simulated::{SimulatedHardware, SimulatedSample};

use crate::error::{HardwareError, SensorInitError};
use crate::reading::SensorType;

/// One DHT22 sample. The sensor may deliver one value without the other.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dht22Sample {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

/// One BME680 sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bme680Sample {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub gas_resistance: f64,
    /// Gas heater reached its target temperature; `gas_resistance` is only
    /// meaningful when this is set.
    pub heat_stable: bool,
}

/// One ADC conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcSample {
    /// Converter counts.
    pub raw: u16,
    pub voltage: f64,
}

/// Blocking sensor access, one call per sample.
///
/// `channel` is the manifest's pin/channel column: the GPIO pin for DHT22,
/// the device selector for BME680 and the input channel for the ADC.
pub trait Hardware: Send + Sync {
    /// Check that the bus and device for a sensor family are present.
    fn probe(&self, sensor_type: SensorType) -> Result<(), SensorInitError>;

    /// Read humidity and temperature from a DHT22.
    fn read_dht22(&self, pin: u32) -> Result<Dht22Sample, HardwareError>;

    /// Trigger a forced-mode BME680 measurement and read it back.
    fn read_bme680(&self, channel: u32) -> Result<Bme680Sample, HardwareError>;

    /// Convert one ADC channel.
    fn read_adc(&self, channel: u32) -> Result<AdcSample, HardwareError>;
}
