// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! SQLite reading store
//!
//! Timestamps are stored as UTC microseconds since the Unix epoch so the
//! `timestamp_us` index orders rows chronologically.

use crate::error::{StorageError, StorageResult};
use crate::reading::{Reading, SensorType};
use crate::store::ReadingStore;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSqlError, Type};
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const SELECT_COLUMNS: &str = "timestamp_us, device_id, device_name, location, sensor_type,
     temperature, humidity, pressure, gas_resistance, adc_raw_value, adc_voltage";

/// SQLite reading store
///
/// Thread-safe via internal Mutex (SQLite Connection is not Sync). Separate
/// processes sharing the file rely on WAL mode and the busy timeout.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE readings (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     timestamp_us INTEGER NOT NULL,
///     device_id TEXT NOT NULL,
///     device_name TEXT NOT NULL,
///     location TEXT NOT NULL,
///     sensor_type TEXT NOT NULL,
///     temperature REAL,
///     humidity REAL,
///     pressure REAL,
///     gas_resistance REAL,
///     adc_raw_value INTEGER,
///     adc_voltage REAL
/// );
/// CREATE INDEX idx_readings_timestamp ON readings(timestamp_us);
/// ```
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating the parent
    /// directory and the schema when missing.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|source| StorageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        tracing::debug!("Opened reading store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Create the schema if absent. Safe to call on an existing database.
    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp_us INTEGER NOT NULL,
                device_id TEXT NOT NULL,
                device_name TEXT NOT NULL,
                location TEXT NOT NULL,
                sensor_type TEXT NOT NULL,
                temperature REAL,
                humidity REAL,
                pressure REAL,
                gas_resistance REAL,
                adc_raw_value INTEGER,
                adc_voltage REAL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_readings_timestamp ON readings(timestamp_us)",
            [],
        )?;

        Ok(())
    }

    fn insert_row(conn: &Connection, reading: &Reading) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO readings (timestamp_us, device_id, device_name, location, sensor_type,
                temperature, humidity, pressure, gas_resistance, adc_raw_value, adc_voltage)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                reading.timestamp.timestamp_micros(),
                reading.device_id,
                reading.device_name,
                reading.location,
                reading.sensor_type.as_str(),
                reading.temperature,
                reading.humidity,
                reading.pressure,
                reading.gas_resistance,
                reading.adc_raw_value,
                reading.adc_voltage,
            ],
        )
    }

    /// Map a row selected with [`SELECT_COLUMNS`] back to a Reading
    fn row_to_reading(row: &rusqlite::Row) -> rusqlite::Result<Reading> {
        let timestamp_us: i64 = row.get(0)?;
        let timestamp = DateTime::<Utc>::from_timestamp_micros(timestamp_us).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Integer,
                Box::new(FromSqlError::OutOfRange(timestamp_us)),
            )
        })?;

        let sensor_type: String = row.get(4)?;
        let sensor_type = sensor_type.parse::<SensorType>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
        })?;

        Ok(Reading {
            timestamp,
            device_id: row.get(1)?,
            device_name: row.get(2)?,
            location: row.get(3)?,
            sensor_type,
            temperature: row.get(5)?,
            humidity: row.get(6)?,
            pressure: row.get(7)?,
            gas_resistance: row.get(8)?,
            adc_raw_value: row.get(9)?,
            adc_voltage: row.get(10)?,
        })
    }
}

impl ReadingStore for SqliteStore {
    fn insert(&self, reading: &Reading) -> StorageResult<()> {
        let conn = self.lock()?;
        Self::insert_row(&conn, reading)?;
        Ok(())
    }

    fn insert_batch(&self, readings: &[Reading]) -> StorageResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for reading in readings {
            Self::insert_row(&tx, reading)?;
        }
        tx.commit()?;
        Ok(readings.len())
    }

    fn query_since(&self, since: DateTime<Utc>) -> StorageResult<Vec<Reading>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS}
             FROM readings
             WHERE timestamp_us > ?1
             ORDER BY timestamp_us ASC, id ASC"
        ))?;

        let readings = stmt
            .query_map([since.timestamp_micros()], Self::row_to_reading)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(readings)
    }

    fn query_latest(&self) -> StorageResult<Option<Reading>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS}
             FROM readings
             ORDER BY timestamp_us DESC, id DESC
             LIMIT 1"
        ))?;

        let mut rows = stmt.query_map([], Self::row_to_reading)?;
        let latest = rows.next().transpose()?;
        Ok(latest)
    }

    fn count(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn reading_at(timestamp: DateTime<Utc>, location: &str) -> Reading {
        Reading {
            timestamp,
            device_id: "abc".to_string(),
            device_name: "pi1".to_string(),
            location: location.to_string(),
            sensor_type: SensorType::Dht22,
            temperature: Some(19.5),
            humidity: Some(52.0),
            pressure: None,
            gas_resistance: None,
            adc_raw_value: None,
            adc_voltage: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_insert_then_latest_round_trips() {
        let store = SqliteStore::in_memory().unwrap();
        let reading = Reading {
            timestamp: t0() + ChronoDuration::microseconds(123_456),
            device_id: "abc".to_string(),
            device_name: "pi1".to_string(),
            location: "kitchen".to_string(),
            sensor_type: SensorType::Bme680,
            temperature: Some(21.5),
            humidity: Some(40.2),
            pressure: Some(1012.4),
            gas_resistance: None,
            adc_raw_value: None,
            adc_voltage: None,
        };

        store.insert(&reading).unwrap();

        assert_eq!(store.query_latest().unwrap(), Some(reading));
    }

    #[test]
    fn test_adc_columns_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let mut reading = reading_at(t0(), "tomatoes");
        reading.sensor_type = SensorType::AnalogAdc;
        reading.temperature = None;
        reading.humidity = None;
        reading.adc_raw_value = Some(u16::MAX);
        reading.adc_voltage = Some(3.3);

        store.insert(&reading).unwrap();
        assert_eq!(store.query_latest().unwrap(), Some(reading));
    }

    #[test]
    fn test_query_since_is_strict() {
        let store = SqliteStore::in_memory().unwrap();
        let second = ChronoDuration::seconds(1);

        store.insert(&reading_at(t0() - second, "before")).unwrap();
        store.insert(&reading_at(t0(), "at")).unwrap();
        store.insert(&reading_at(t0() + second, "after")).unwrap();

        let since = store.query_since(t0()).unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].location, "after");
    }

    #[test]
    fn test_query_since_orders_by_timestamp() {
        let store = SqliteStore::in_memory().unwrap();
        for (offset, location) in [(30, "c"), (10, "a"), (20, "b")] {
            store
                .insert(&reading_at(t0() + ChronoDuration::seconds(offset), location))
                .unwrap();
        }

        let locations: Vec<_> = store
            .query_since(t0())
            .unwrap()
            .into_iter()
            .map(|r| r.location)
            .collect();
        assert_eq!(locations, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_store() {
        let store = SqliteStore::in_memory().unwrap();

        assert!(store.query_since(t0()).unwrap().is_empty());
        assert_eq!(store.query_latest().unwrap(), None);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_latest_tie_goes_to_last_insert() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert(&reading_at(t0(), "first")).unwrap();
        store.insert(&reading_at(t0(), "second")).unwrap();
        store
            .insert(&reading_at(t0() - ChronoDuration::seconds(5), "older"))
            .unwrap();

        assert_eq!(store.query_latest().unwrap().unwrap().location, "second");
    }

    #[test]
    fn test_duplicates_are_appended() {
        let store = SqliteStore::in_memory().unwrap();
        let reading = reading_at(t0(), "kitchen");
        store.insert(&reading).unwrap();
        store.insert(&reading).unwrap();

        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_insert_batch() {
        let store = SqliteStore::in_memory().unwrap();
        let batch: Vec<_> = (0..5)
            .map(|i| reading_at(t0() + ChronoDuration::minutes(i), "hall"))
            .collect();

        assert_eq!(store.insert_batch(&batch).unwrap(), 5);
        assert_eq!(store.count().unwrap(), 5);
    }

    #[test]
    fn test_open_creates_directory_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("locallogs.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&reading_at(t0(), "kitchen")).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_open_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();

        assert!(SqliteStore::open(blocker.join("locallogs.db")).is_err());
    }
}
