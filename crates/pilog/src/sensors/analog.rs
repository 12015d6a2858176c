// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Analog channel adapter (MCP3008 soil-moisture probe and similar).

use crate::hardware::Hardware;
use crate::reading::{capture_time, Measurement, SensorType};
use std::sync::Arc;

pub struct AnalogAdcAdapter {
    hardware: Arc<dyn Hardware>,
}

impl AnalogAdcAdapter {
    pub fn new(hardware: Arc<dyn Hardware>) -> Self {
        Self { hardware }
    }

    /// A zero conversion is a valid reading (dry probe); only a failed
    /// conversion yields `None`.
    pub fn poll(&self, channel: u32) -> Option<Measurement> {
        let timestamp = capture_time();
        tracing::info!(sensor_type = "analog_adc", channel, "Polling ADC channel");

        match self.hardware.read_adc(channel) {
            Ok(sample) => {
                let mut measurement = Measurement::new(SensorType::AnalogAdc, timestamp);
                measurement.adc_raw_value = Some(sample.raw);
                measurement.adc_voltage = Some(sample.voltage);
                Some(measurement)
            }
            Err(e) => {
                tracing::info!(channel, "Failed to retrieve data from ADC channel: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{AdcSample, SimulatedHardware, SimulatedSample};

    #[test]
    fn test_zero_is_valid() {
        let hw = SimulatedHardware::new().script(
            SensorType::AnalogAdc,
            1,
            SimulatedSample::Adc(AdcSample { raw: 0, voltage: 0.0 }),
        );
        let m = AnalogAdcAdapter::new(Arc::new(hw)).poll(1).unwrap();

        assert_eq!(m.sensor_type, SensorType::AnalogAdc);
        assert_eq!(m.adc_raw_value, Some(0));
        assert_eq!(m.adc_voltage, Some(0.0));
        assert_eq!(m.temperature, None);
    }

    #[test]
    fn test_failed_conversion_is_none() {
        let hw = SimulatedHardware::new().broken(SensorType::AnalogAdc, 1);
        assert!(AnalogAdcAdapter::new(Arc::new(hw)).poll(1).is_none());
    }
}
