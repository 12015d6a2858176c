// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Canonical reading record.
//!
//! Every sensor family is normalised into one [`Reading`] shape. Which of the
//! optional measurement fields are populated depends on the [`SensorType`].

use crate::device::DeviceIdentity;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported sensor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    /// Single-wire humidity/temperature sensor.
    Dht22,
    /// I2C gas/temperature/humidity/pressure sensor.
    Bme680,
    /// Analog channel behind an SPI ADC (MCP3008 soil-moisture probe).
    AnalogAdc,
}

impl SensorType {
    /// All supported sensor types, in poll order.
    pub const ALL: [SensorType; 3] = [Self::Dht22, Self::Bme680, Self::AnalogAdc];

    /// Canonical lowercase name, as stored and serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dht22 => "dht22",
            Self::Bme680 => "bme680",
            Self::AnalogAdc => "analog_adc",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a manifest or stored row names a sensor type this build
/// does not support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSensorType(pub String);

impl fmt::Display for UnknownSensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sensor type '{}'", self.0)
    }
}

impl std::error::Error for UnknownSensorType {}

impl FromStr for SensorType {
    type Err = UnknownSensorType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dht22" => Ok(Self::Dht22),
            "bme680" => Ok(Self::Bme680),
            // Older manifests name the converter chip instead of the channel kind
            "analog_adc" | "mcp3008" | "mcp" => Ok(Self::AnalogAdc),
            _ => Err(UnknownSensorType(s.trim().to_string())),
        }
    }
}

/// Current time at the precision the store keeps (microseconds).
pub fn capture_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Raw output of one adapter poll, before device identity is attached.
///
/// The timestamp is captured once per poll and shared by every field.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub timestamp: DateTime<Utc>,
    pub sensor_type: SensorType,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub gas_resistance: Option<f64>,
    pub adc_raw_value: Option<u16>,
    pub adc_voltage: Option<f64>,
}

impl Measurement {
    /// Empty measurement of the given type; adapters fill the fields they own.
    pub fn new(sensor_type: SensorType, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            sensor_type,
            temperature: None,
            humidity: None,
            pressure: None,
            gas_resistance: None,
            adc_raw_value: None,
            adc_voltage: None,
        }
    }
}

/// One normalised sensor observation.
///
/// Immutable once persisted. `(device_id, location, timestamp)` is the
/// natural identity but duplicates are tolerated; the store is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Collection time, UTC.
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub device_name: String,
    pub location: String,
    pub sensor_type: SensorType,
    /// Degrees Celsius.
    pub temperature: Option<f64>,
    /// Relative humidity, percent.
    pub humidity: Option<f64>,
    /// Hectopascal.
    pub pressure: Option<f64>,
    /// Ohm; only set when the heater reading was thermally stable.
    pub gas_resistance: Option<f64>,
    pub adc_raw_value: Option<u16>,
    /// Volts.
    pub adc_voltage: Option<f64>,
}

impl Reading {
    /// Attach device identity and placement to an adapter measurement.
    pub fn from_measurement(
        measurement: Measurement,
        identity: &DeviceIdentity,
        location: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: measurement.timestamp,
            device_id: identity.device_id.clone(),
            device_name: identity.device_name.clone(),
            location: location.into(),
            sensor_type: measurement.sensor_type,
            temperature: measurement.temperature,
            humidity: measurement.humidity,
            pressure: measurement.pressure,
            gas_resistance: measurement.gas_resistance,
            adc_raw_value: measurement.adc_raw_value,
            adc_voltage: measurement.adc_voltage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("00000000a1b2c3d4", "pi1")
    }

    #[test]
    fn test_sensor_type_aliases() {
        assert_eq!("dht22".parse::<SensorType>().unwrap(), SensorType::Dht22);
        assert_eq!(" BME680 ".parse::<SensorType>().unwrap(), SensorType::Bme680);
        assert_eq!("mcp3008".parse::<SensorType>().unwrap(), SensorType::AnalogAdc);
        assert_eq!("analog_adc".parse::<SensorType>().unwrap(), SensorType::AnalogAdc);
        assert_eq!(
            "sht31".parse::<SensorType>(),
            Err(UnknownSensorType("sht31".to_string()))
        );
    }

    #[test]
    fn test_sensor_type_serde_names() {
        let json = serde_json::to_string(&SensorType::AnalogAdc).unwrap();
        assert_eq!(json, "\"analog_adc\"");
        for kind in SensorType::ALL {
            assert_eq!(kind.as_str().parse::<SensorType>().unwrap(), kind);
        }
    }

    #[test]
    fn test_from_measurement_keeps_fields() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut m = Measurement::new(SensorType::Bme680, ts);
        m.temperature = Some(21.5);
        m.humidity = Some(40.2);

        let reading = Reading::from_measurement(m, &identity(), "kitchen");
        assert_eq!(reading.timestamp, ts);
        assert_eq!(reading.device_id, "00000000a1b2c3d4");
        assert_eq!(reading.device_name, "pi1");
        assert_eq!(reading.location, "kitchen");
        assert_eq!(reading.temperature, Some(21.5));
        assert_eq!(reading.gas_resistance, None);
    }

    #[test]
    fn test_wire_format_keeps_nulls() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut m = Measurement::new(SensorType::AnalogAdc, ts);
        m.adc_raw_value = Some(31_744);
        m.adc_voltage = Some(1.6);
        let reading = Reading::from_measurement(m, &identity(), "bed-3");

        let value = serde_json::to_value(&reading).unwrap();
        assert!(value["temperature"].is_null());
        assert_eq!(value["sensor_type"], "analog_adc");
        assert_eq!(value["adc_raw_value"], 31_744);

        let parsed: Reading = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, reading);
    }
}
