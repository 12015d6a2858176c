// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Sensor manifest loader.
//!
//! The manifest is a CSV table shared by every device in a deployment:
//!
//! ```text
//! location,name,type,pin
//! kitchen,pi1,dht22,4
//! outside,pi1,bme680,0
//! tomatoes,pi2,mcp3008,1
//! ```
//!
//! Rows are filtered to one device and grouped by sensor type. Rows naming
//! a sensor type this build does not support are dropped, not rejected, so
//! one manifest can serve devices running different builds.

use crate::error::ConfigError;
use crate::reading::SensorType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 4] = ["location", "name", "type", "pin"];

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorConfigEntry {
    pub device_name: String,
    pub location: String,
    pub sensor_type: SensorType,
    /// GPIO pin, I2C device index or ADC channel depending on the type.
    pub channel: u32,
}

/// Manifest rows for one device, partitioned by sensor type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorManifest {
    groups: BTreeMap<SensorType, Vec<SensorConfigEntry>>,
}

impl SensorManifest {
    /// Entries configured for one sensor type, in manifest order.
    pub fn entries(&self, sensor_type: SensorType) -> &[SensorConfigEntry] {
        self.groups
            .get(&sensor_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sensor types with at least one configured entry.
    pub fn sensor_types(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.groups
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(kind, _)| *kind)
    }

    /// Total number of configured sensors.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an entry to its type's group.
    pub fn push(&mut self, entry: SensorConfigEntry) {
        self.groups.entry(entry.sensor_type).or_default().push(entry);
    }
}

impl FromIterator<SensorConfigEntry> for SensorManifest {
    fn from_iter<I: IntoIterator<Item = SensorConfigEntry>>(iter: I) -> Self {
        let mut manifest = Self::default();
        for entry in iter {
            manifest.push(entry);
        }
        manifest
    }
}

/// Load the manifest at `path` and keep the rows for `device_name`.
pub fn load(device_name: &str, path: &Path) -> Result<SensorManifest, ConfigError> {
    tracing::info!("Reading sensor manifest {}", path.display());

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let manifest = parse(device_name, &content)?;
    for kind in SensorType::ALL {
        let locations: Vec<&str> = manifest
            .entries(kind)
            .iter()
            .map(|e| e.location.as_str())
            .collect();
        tracing::info!("{} sensors: {}", kind, locations.join(", "));
    }

    Ok(manifest)
}

/// Parse manifest text and keep the rows for `device_name`.
pub fn parse(device_name: &str, content: &str) -> Result<SensorManifest, ConfigError> {
    let mut rows = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        });

    let (header_line, header) = rows.next().ok_or(ConfigError::Malformed {
        line: 1,
        reason: "empty manifest".to_string(),
    })?;
    let header = split_row(header, header_line)?;
    let columns = Columns::from_header(&header)?;

    let mut manifest = SensorManifest::default();
    for (line, raw) in rows {
        let fields = split_row(raw, line)?;
        if fields.len() != header.len() {
            return Err(ConfigError::Malformed {
                line,
                reason: format!("expected {} fields, found {}", header.len(), fields.len()),
            });
        }

        if fields[columns.name] != device_name {
            continue;
        }

        // Unsupported types are skipped before their channel is looked at
        let sensor_type = match fields[columns.sensor_type].parse::<SensorType>() {
            Ok(kind) => kind,
            Err(unknown) => {
                tracing::debug!("Skipping line {}: {}", line, unknown);
                continue;
            }
        };

        let channel = fields[columns.pin]
            .parse::<u32>()
            .map_err(|_| ConfigError::Malformed {
                line,
                reason: format!("pin '{}' is not a non-negative integer", fields[columns.pin]),
            })?;

        manifest.push(SensorConfigEntry {
            device_name: fields[columns.name].clone(),
            location: fields[columns.location].clone(),
            sensor_type,
            channel,
        });
    }

    Ok(manifest)
}

/// Column positions resolved from the header row.
struct Columns {
    location: usize,
    name: usize,
    sensor_type: usize,
    pin: usize,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, ConfigError> {
        let find = |column: &'static str| {
            header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(column))
                .ok_or(ConfigError::MissingColumn(column))
        };

        let [location, name, sensor_type, pin] = REQUIRED_COLUMNS;
        Ok(Self {
            location: find(location)?,
            name: find(name)?,
            sensor_type: find(sensor_type)?,
            pin: find(pin)?,
        })
    }
}

/// Split one CSV row. Double-quoted fields may contain commas and `""`
/// escapes a quote inside a quoted field.
pub(crate) fn split_row(raw: &str, line: usize) -> Result<Vec<String>, ConfigError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(ConfigError::Malformed {
            line,
            reason: "unterminated quoted field".to_string(),
        });
    }

    fields.push(current.trim().to_string());
    Ok(fields)
}
