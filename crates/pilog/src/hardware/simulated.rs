// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Simulated hardware
//!
//! Serves scripted samples per `(sensor type, channel)` and falls back to
//! steady indoor values once a script runs dry. Used by the test suite and
//! by `--simulate` runs on machines without sensors attached.

use super::{AdcSample, Bme680Sample, Dht22Sample, Hardware};
use crate::error::{HardwareError, SensorInitError};
use crate::reading::SensorType;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A scripted response for one read call.
#[derive(Debug, Clone)]
pub enum SimulatedSample {
    Dht22(Dht22Sample),
    Bme680(Bme680Sample),
    Adc(AdcSample),
    Fail(HardwareError),
}

/// In-memory [`Hardware`] implementation.
#[derive(Debug, Default)]
pub struct SimulatedHardware {
    absent: HashSet<SensorType>,
    broken: HashSet<(SensorType, u32)>,
    scripts: Mutex<HashMap<(SensorType, u32), VecDeque<SimulatedSample>>>,
    reads: Mutex<HashMap<SensorType, u64>>,
    sequence: AtomicU64,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `probe` fail for a sensor type.
    pub fn without(mut self, sensor_type: SensorType) -> Self {
        self.absent.insert(sensor_type);
        self
    }

    /// Make every read on a channel fail.
    pub fn broken(mut self, sensor_type: SensorType, channel: u32) -> Self {
        self.broken.insert((sensor_type, channel));
        self
    }

    /// Queue a response for the next read on a channel.
    pub fn script(self, sensor_type: SensorType, channel: u32, sample: SimulatedSample) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts
                .entry((sensor_type, channel))
                .or_default()
                .push_back(sample);
        }
        self
    }

    /// Number of read calls made for a sensor type.
    pub fn read_count(&self, sensor_type: SensorType) -> u64 {
        self.reads
            .lock()
            .map(|reads| reads.get(&sensor_type).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn next(&self, sensor_type: SensorType, channel: u32) -> Option<SimulatedSample> {
        if let Ok(mut reads) = self.reads.lock() {
            *reads.entry(sensor_type).or_default() += 1;
        }

        if self.broken.contains(&(sensor_type, channel)) {
            return Some(SimulatedSample::Fail(HardwareError::Timeout(channel)));
        }

        self.scripts
            .lock()
            .ok()?
            .get_mut(&(sensor_type, channel))?
            .pop_front()
    }

    /// Small deterministic wobble so repeated dry-run readings differ.
    fn drift(&self) -> f64 {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        (n % 10) as f64 * 0.1
    }
}

fn unexpected(channel: u32, sample: &SimulatedSample) -> HardwareError {
    HardwareError::Bus {
        channel,
        detail: format!("scripted sample of wrong kind: {:?}", sample),
    }
}

impl Hardware for SimulatedHardware {
    fn probe(&self, sensor_type: SensorType) -> Result<(), SensorInitError> {
        if self.absent.contains(&sensor_type) {
            return Err(SensorInitError::NotFound {
                sensor_type,
                detail: "simulated device absent".to_string(),
            });
        }
        Ok(())
    }

    fn read_dht22(&self, pin: u32) -> Result<Dht22Sample, HardwareError> {
        match self.next(SensorType::Dht22, pin) {
            Some(SimulatedSample::Dht22(sample)) => Ok(sample),
            Some(SimulatedSample::Fail(e)) => Err(e),
            Some(other) => Err(unexpected(pin, &other)),
            None => Ok(Dht22Sample {
                temperature: Some(20.0 + self.drift()),
                humidity: Some(45.0),
            }),
        }
    }

    fn read_bme680(&self, channel: u32) -> Result<Bme680Sample, HardwareError> {
        match self.next(SensorType::Bme680, channel) {
            Some(SimulatedSample::Bme680(sample)) => Ok(sample),
            Some(SimulatedSample::Fail(e)) => Err(e),
            Some(other) => Err(unexpected(channel, &other)),
            None => Ok(Bme680Sample {
                temperature: 21.0 + self.drift(),
                humidity: 40.0,
                pressure: 1013.25,
                gas_resistance: 120_000.0,
                heat_stable: true,
            }),
        }
    }

    fn read_adc(&self, channel: u32) -> Result<AdcSample, HardwareError> {
        match self.next(SensorType::AnalogAdc, channel) {
            Some(SimulatedSample::Adc(sample)) => Ok(sample),
            Some(SimulatedSample::Fail(e)) => Err(e),
            Some(other) => Err(unexpected(channel, &other)),
            None => Ok(AdcSample {
                raw: 512,
                voltage: 1.65,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_then_default() {
        let hw = SimulatedHardware::new().script(
            SensorType::Dht22,
            4,
            SimulatedSample::Fail(HardwareError::Checksum(4)),
        );

        assert_eq!(hw.read_dht22(4), Err(HardwareError::Checksum(4)));
        assert!(hw.read_dht22(4).unwrap().temperature.is_some());
        assert_eq!(hw.read_count(SensorType::Dht22), 2);
    }

    #[test]
    fn test_absent_and_broken() {
        let hw = SimulatedHardware::new()
            .without(SensorType::Bme680)
            .broken(SensorType::AnalogAdc, 2);

        assert!(hw.probe(SensorType::Bme680).is_err());
        assert!(hw.probe(SensorType::AnalogAdc).is_ok());
        assert_eq!(hw.read_adc(2), Err(HardwareError::Timeout(2)));
        assert!(hw.read_adc(1).is_ok());
    }
}
