// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Linux Industrial I/O backend
//!
//! Reads sensors through the kernel's IIO sysfs interface, so the bus
//! protocols stay in the kernel drivers:
//!
//! | Sensor | Driver | Overlay |
//! |--------|--------|---------|
//! | DHT22 | `dht11` | `dtoverlay=dht11,gpiopin=<pin>` |
//! | BME680 | `bme680` | `dtoverlay=i2c-sensor,bme680` |
//! | MCP3008 | `mcp320x` | `dtoverlay=mcp3008` |
//!
//! A device is matched to a manifest channel through the unit address of
//! its device-tree node (`dht11@4`, `bme680@76`). When only one device of a
//! driver exists it is used for every channel.

use super::{AdcSample, Bme680Sample, Dht22Sample, Hardware};
use crate::error::{HardwareError, SensorInitError};
use crate::reading::SensorType;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default sysfs mount point of IIO devices.
pub const IIO_ROOT: &str = "/sys/bus/iio/devices";

/// IIO sysfs hardware backend.
#[derive(Debug, Clone)]
pub struct IioHardware {
    root: PathBuf,
}

#[derive(Debug)]
struct IioDevice {
    path: PathBuf,
    unit_address: Option<u32>,
}

impl IioHardware {
    /// Backend rooted at `root` (normally [`IIO_ROOT`]).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn driver_names(sensor_type: SensorType) -> &'static [&'static str] {
        match sensor_type {
            SensorType::Dht22 => &["dht11"],
            SensorType::Bme680 => &["bme680"],
            SensorType::AnalogAdc => &["mcp3008", "mcp3004", "mcp3208", "mcp3204"],
        }
    }

    /// List IIO devices bound to the driver for `sensor_type`.
    fn devices(&self, sensor_type: SensorType) -> io::Result<Vec<IioDevice>> {
        let names = Self::driver_names(sensor_type);
        let mut devices = Vec::new();

        for entry in fs::read_dir(&self.root)?.flatten() {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.starts_with("iio:device") {
                continue;
            }

            let path = entry.path();
            let Ok(name) = fs::read_to_string(path.join("name")) else {
                continue;
            };
            if !names.contains(&name.trim()) {
                continue;
            }

            let unit_address = fs::read_link(path.join("of_node"))
                .ok()
                .and_then(|target| unit_address(&target));
            devices.push(IioDevice { path, unit_address });
        }

        devices.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(devices)
    }

    /// Pick the device serving `channel`.
    fn select(&self, sensor_type: SensorType, channel: u32) -> Result<PathBuf, HardwareError> {
        let devices = self.devices(sensor_type).map_err(|e| HardwareError::Bus {
            channel,
            detail: e.to_string(),
        })?;

        if let Some(device) = devices.iter().find(|d| d.unit_address == Some(channel)) {
            return Ok(device.path.clone());
        }

        match devices.as_slice() {
            [only] => Ok(only.path.clone()),
            [] => Err(HardwareError::Bus {
                channel,
                detail: format!("no {} device present", sensor_type),
            }),
            _ => Err(HardwareError::Bus {
                channel,
                detail: format!("no {} device at unit address {:x}", sensor_type, channel),
            }),
        }
    }
}

/// Parse the hex unit address from a device-tree node path (`.../dht11@4`).
fn unit_address(of_node: &Path) -> Option<u32> {
    let node = of_node.file_name()?.to_str()?;
    let (_, address) = node.rsplit_once('@')?;
    u32::from_str_radix(address, 16).ok()
}

/// Read one numeric sysfs attribute. Reading a `*_input` or `*_raw`
/// attribute is what triggers the conversion in the driver.
fn read_attr(device: &Path, attr: &str, channel: u32) -> Result<f64, HardwareError> {
    let text = fs::read_to_string(device.join(attr)).map_err(|e| io_to_hardware(e, channel))?;
    text.trim()
        .parse::<f64>()
        .map_err(|_| HardwareError::NoData(channel))
}

fn io_to_hardware(err: io::Error, channel: u32) -> HardwareError {
    match err.raw_os_error() {
        Some(libc::ETIMEDOUT) => HardwareError::Timeout(channel),
        Some(libc::ENODATA) => HardwareError::NoData(channel),
        _ => HardwareError::Bus {
            channel,
            detail: err.to_string(),
        },
    }
}

impl Hardware for IioHardware {
    fn probe(&self, sensor_type: SensorType) -> Result<(), SensorInitError> {
        let devices = self.devices(sensor_type).map_err(|e| SensorInitError::Bus {
            sensor_type,
            detail: format!("{}: {}", self.root.display(), e),
        })?;

        if devices.is_empty() {
            return Err(SensorInitError::NotFound {
                sensor_type,
                detail: format!(
                    "no IIO device named {} under {}",
                    Self::driver_names(sensor_type).join("/"),
                    self.root.display()
                ),
            });
        }

        tracing::debug!(
            "Found {} {} device(s) under {}",
            devices.len(),
            sensor_type,
            self.root.display()
        );
        Ok(())
    }

    fn read_dht22(&self, pin: u32) -> Result<Dht22Sample, HardwareError> {
        let device = self.select(SensorType::Dht22, pin)?;

        // dht11 driver: millidegrees Celsius, milli-percent humidity
        let temperature = read_attr(&device, "in_temp_input", pin).map(|v| v / 1000.0);
        let humidity = read_attr(&device, "in_humidityrelative_input", pin).map(|v| v / 1000.0);

        match (temperature, humidity) {
            (Err(e), Err(_)) => Err(e),
            (t, h) => Ok(Dht22Sample {
                temperature: t.ok(),
                humidity: h.ok(),
            }),
        }
    }

    fn read_bme680(&self, channel: u32) -> Result<Bme680Sample, HardwareError> {
        let device = self.select(SensorType::Bme680, channel)?;

        // bme680 driver: millidegrees Celsius, percent humidity, kPa
        let temperature = read_attr(&device, "in_temp_input", channel)? / 1000.0;
        let humidity = read_attr(&device, "in_humidityrelative_input", channel)?;
        let pressure = read_attr(&device, "in_pressure_input", channel)? * 10.0;

        // The driver rejects the gas read when the heater is not stable
        let gas = read_attr(&device, "in_resistance_input", channel);

        Ok(Bme680Sample {
            temperature,
            humidity,
            pressure,
            gas_resistance: gas.as_ref().copied().unwrap_or_default(),
            heat_stable: gas.is_ok(),
        })
    }

    fn read_adc(&self, channel: u32) -> Result<AdcSample, HardwareError> {
        let device = self.select(SensorType::AnalogAdc, u32::MAX)?;

        let raw = read_attr(&device, &format!("in_voltage{}_raw", channel), channel)?;
        // Scale is millivolts per count, shared by all channels
        let scale = read_attr(&device, "in_voltage_scale", channel)?;

        if !(0.0..=f64::from(u16::MAX)).contains(&raw) {
            return Err(HardwareError::NoData(channel));
        }

        Ok(AdcSample {
            raw: raw as u16,
            voltage: raw * scale / 1000.0,
        })
    }
}
