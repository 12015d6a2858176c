// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Error taxonomy for the logging pipeline.
//!
//! | Error | Scope |
//! |-------|-------|
//! | [`ConfigError`] | fatal at startup |
//! | [`SensorInitError`] | disables one sensor type for the process lifetime |
//! | [`HardwareError`] | one failed sample, absorbed inside the adapter |
//! | [`StorageError`] | fatal to the current poll cycle or request |

use crate::reading::SensorType;
use std::path::PathBuf;
use thiserror::Error;

/// Manifest or settings could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("manifest is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A sensor adapter could not be constructed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SensorInitError {
    #[error("{sensor_type} not found: {detail}")]
    NotFound {
        sensor_type: SensorType,
        detail: String,
    },

    #[error("{sensor_type} bus misconfigured: {detail}")]
    Bus {
        sensor_type: SensorType,
        detail: String,
    },
}

impl SensorInitError {
    /// Sensor type that failed to initialise.
    pub fn sensor_type(&self) -> SensorType {
        match self {
            Self::NotFound { sensor_type, .. } | Self::Bus { sensor_type, .. } => *sensor_type,
        }
    }
}

/// Transient failure of a single hardware sample.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HardwareError {
    #[error("no data returned on channel {0}")]
    NoData(u32),

    #[error("bus error on channel {channel}: {detail}")]
    Bus { channel: u32, detail: String },

    #[error("checksum mismatch on channel {0}")]
    Checksum(u32),

    #[error("timed out on channel {0}")]
    Timeout(u32),
}

/// Backing store unreachable or write rejected.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store connection lock poisoned")]
    Poisoned,
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
