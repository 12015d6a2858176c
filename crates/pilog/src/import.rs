// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Import of legacy flat CSV logs into the reading store.
//!
//! The legacy log has one row per observation with the columns
//! `datetime,name,type,temp,relhum,pressure,airquality,pi` (any order, any
//! case). `name` is the location and `pi` the device name; `datetime` uses
//! `%d/%m/%Y %H:%M:%S` and is taken as UTC.

use crate::device::DeviceIdentity;
use crate::error::{ConfigError, StorageError};
use crate::manifest::split_row;
use crate::reading::{Reading, SensorType};
use crate::store::ReadingStore;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Legacy import failures.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Format(#[from] ConfigError),

    #[error("bad value at line {line}: {reason}")]
    BadValue { line: usize, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Rows with a sensor type this build does not know
    pub skipped: usize,
}

struct LegacyColumns {
    datetime: usize,
    location: usize,
    sensor_type: usize,
    temperature: Option<usize>,
    humidity: Option<usize>,
    pressure: Option<usize>,
    gas: Option<usize>,
    device_name: Option<usize>,
}

impl LegacyColumns {
    fn from_header(header: &[String]) -> Result<Self, ConfigError> {
        let position = |column: &str| header.iter().position(|h| h.eq_ignore_ascii_case(column));
        let require = |column: &'static str| position(column).ok_or(ConfigError::MissingColumn(column));

        Ok(Self {
            datetime: require("datetime")?,
            location: require("name")?,
            sensor_type: require("type")?,
            temperature: position("temp"),
            humidity: position("relhum"),
            pressure: position("pressure"),
            gas: position("airquality"),
            device_name: position("pi"),
        })
    }
}

/// Import the legacy log at `path`. Every row gets `identity.device_id`;
/// rows without a `pi` value get `identity.device_name`.
pub fn import_legacy_csv<S: ReadingStore + ?Sized>(
    path: &Path,
    identity: &DeviceIdentity,
    store: &S,
) -> Result<ImportSummary, ImportError> {
    tracing::info!("Importing legacy log {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (readings, skipped) = parse_legacy(&content, identity)?;
    let imported = store.insert_batch(&readings)?;

    tracing::info!("Imported {} readings, skipped {} rows", imported, skipped);
    Ok(ImportSummary { imported, skipped })
}

/// Parse legacy log text into readings, returning them with the count of
/// skipped rows.
pub fn parse_legacy(
    content: &str,
    identity: &DeviceIdentity,
) -> Result<(Vec<Reading>, usize), ImportError> {
    let mut rows = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((header_line, header)) = rows.next() else {
        return Ok((Vec::new(), 0));
    };
    let header = split_row(header, header_line)?;
    let columns = LegacyColumns::from_header(&header)?;

    let mut readings = Vec::new();
    let mut skipped = 0;

    for (line, raw) in rows {
        let fields = split_row(raw, line)?;
        if fields.len() != header.len() {
            return Err(ImportError::BadValue {
                line,
                reason: format!("expected {} fields, found {}", header.len(), fields.len()),
            });
        }
        let field = |index: usize| fields[index].as_str();
        let number = |index: Option<usize>| -> Result<Option<f64>, ImportError> {
            let Some(value) = index.map(field).filter(|v| !v.is_empty()) else {
                return Ok(None);
            };
            value.parse::<f64>().map(Some).map_err(|_| ImportError::BadValue {
                line,
                reason: format!("'{}' is not a number", value),
            })
        };

        let sensor_type = match field(columns.sensor_type).parse::<SensorType>() {
            Ok(kind) => kind,
            Err(unknown) => {
                tracing::debug!("Skipping line {}: {}", line, unknown);
                skipped += 1;
                continue;
            }
        };

        let timestamp = NaiveDateTime::parse_from_str(field(columns.datetime), DATETIME_FORMAT)
            .map_err(|e| ImportError::BadValue {
                line,
                reason: format!("datetime '{}': {}", field(columns.datetime), e),
            })?
            .and_utc();

        let device_name = columns
            .device_name
            .map(field)
            .filter(|v| !v.is_empty())
            .unwrap_or(identity.device_name.as_str());

        readings.push(Reading {
            timestamp,
            device_id: identity.device_id.clone(),
            device_name: device_name.to_string(),
            location: field(columns.location).to_string(),
            sensor_type,
            temperature: number(columns.temperature)?,
            humidity: number(columns.humidity)?,
            pressure: number(columns.pressure)?,
            gas_resistance: number(columns.gas)?,
            adc_raw_value: None,
            adc_voltage: None,
        });
    }

    Ok((readings, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    const LEGACY: &str = "\
Datetime,Name,Type,Temp,RelHum,Pressure,AirQuality,Pi
01/03/2020 14:05:00,kitchen,dht22,19.5,55.1,,,pi1
01/03/2020 14:05:01,outside,bme680,8.25,80.0,1002.5,95000,pi1
01/03/2020 14:05:02,garage,sds011,,,,,pi1
";

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("00000000cafe", "pi-new")
    }

    #[test]
    fn test_parse_maps_columns() {
        let (readings, skipped) = parse_legacy(LEGACY, &identity()).unwrap();

        assert_eq!(skipped, 1);
        assert_eq!(readings.len(), 2);

        let dht = &readings[0];
        assert_eq!(dht.timestamp, Utc.with_ymd_and_hms(2020, 3, 1, 14, 5, 0).unwrap());
        assert_eq!(dht.location, "kitchen");
        assert_eq!(dht.device_name, "pi1");
        assert_eq!(dht.device_id, "00000000cafe");
        assert_eq!(dht.humidity, Some(55.1));
        assert_eq!(dht.pressure, None);

        let bme = &readings[1];
        assert_eq!(bme.sensor_type, SensorType::Bme680);
        assert_eq!(bme.gas_resistance, Some(95000.0));
    }

    #[test]
    fn test_missing_pi_column_uses_identity() {
        let content = "datetime,name,type,temp\n02/03/2020 00:00:00,cellar,dht22,12\n";
        let (readings, _) = parse_legacy(content, &identity()).unwrap();
        assert_eq!(readings[0].device_name, "pi-new");
    }

    #[test]
    fn test_bad_datetime() {
        let content = "datetime,name,type\n2020-03-01,cellar,dht22\n";
        let err = parse_legacy(content, &identity()).unwrap_err();
        assert!(matches!(err, ImportError::BadValue { line: 2, .. }));
    }

    #[test]
    fn test_short_row_rejected() {
        let content = "datetime,name,type,temp\n02/03/2020 00:00:00,cellar,dht22,12\n02/03/2020 00:05:00\n";
        let err = parse_legacy(content, &identity()).unwrap_err();
        assert!(matches!(err, ImportError::BadValue { line: 3, .. }));
    }

    #[test]
    fn test_missing_required_column() {
        let err = parse_legacy("name,type\nx,dht22\n", &identity()).unwrap_err();
        assert!(matches!(
            err,
            ImportError::Format(ConfigError::MissingColumn("datetime"))
        ));
    }

    #[test]
    fn test_import_appends_to_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LEGACY.as_bytes()).unwrap();
        let store = SqliteStore::in_memory().unwrap();

        let summary = import_legacy_csv(file.path(), &identity(), &store).unwrap();
        assert_eq!(summary, ImportSummary { imported: 2, skipped: 1 });
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.query_latest().unwrap().unwrap().location, "outside");
    }
}
