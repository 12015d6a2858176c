// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Logger settings
//!
//! Supports both programmatic (builder) and file-based (TOML) configuration.
//! Command-line flags are applied on top of whichever was loaded.

use crate::device::{self, DeviceIdentity, CPUINFO_PATH};
use crate::error::ConfigError;
use crate::hardware::{iio::IIO_ROOT, Hardware, IioHardware, SimulatedHardware};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Hardware backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareKind {
    /// Kernel IIO drivers under sysfs
    #[default]
    Iio,
    /// Synthetic samples, no hardware needed
    Simulated,
}

/// Logger settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Name of this device; selects manifest rows.
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Sensor manifest (CSV).
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Pause between poll cycles (seconds).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Hardware backend.
    #[serde(default)]
    pub hardware: HardwareKind,

    /// IIO sysfs root.
    #[serde(default = "default_iio_root")]
    pub iio_root: PathBuf,

    /// Platform identity file.
    #[serde(default = "default_cpuinfo_path")]
    pub cpuinfo_path: PathBuf,

    /// HTTP listen address for the gateway.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_device_name() -> String {
    device::hostname().unwrap_or_else(|| "unknown".to_string())
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("logs/logger_config.csv")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("logs/locallogs.db")
}

fn default_interval_secs() -> u64 {
    300
}

fn default_iio_root() -> PathBuf {
    PathBuf::from(IIO_ROOT)
}

fn default_cpuinfo_path() -> PathBuf {
    PathBuf::from(CPUINFO_PATH)
}

fn default_bind() -> String {
    "0.0.0.0:5002".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            manifest_path: default_manifest_path(),
            database_path: default_database_path(),
            interval_secs: default_interval_secs(),
            hardware: HardwareKind::default(),
            iio_root: default_iio_root(),
            cpuinfo_path: default_cpuinfo_path(),
            bind: default_bind(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Create a new settings builder
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid("interval_secs must be positive".into()));
        }
        if self.device_name.trim().is_empty() {
            return Err(ConfigError::Invalid("device_name is empty".into()));
        }

        for (name, path) in [
            ("manifest_path", &self.manifest_path),
            ("database_path", &self.database_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{} is empty", name)));
            }
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Identity of this host under these settings.
    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::detect(&self.cpuinfo_path, self.device_name.clone())
    }

    /// Construct the configured hardware backend.
    pub fn hardware(&self) -> Arc<dyn Hardware> {
        match self.hardware {
            HardwareKind::Iio => Arc::new(IioHardware::new(&self.iio_root)),
            HardwareKind::Simulated => Arc::new(SimulatedHardware::new()),
        }
    }
}

/// Settings builder for fluent API
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    base: Option<Settings>,
    device_name: Option<String>,
    manifest_path: Option<PathBuf>,
    database_path: Option<PathBuf>,
    interval_secs: Option<u64>,
    hardware: Option<HardwareKind>,
    iio_root: Option<PathBuf>,
    cpuinfo_path: Option<PathBuf>,
    bind: Option<String>,
    log_level: Option<String>,
}

impl SettingsBuilder {
    /// Start from loaded settings instead of the defaults
    pub fn base(mut self, settings: Settings) -> Self {
        self.base = Some(settings);
        self
    }

    pub fn device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = Some(name.into());
        self
    }

    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Set poll interval in seconds
    pub fn interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = Some(secs);
        self
    }

    pub fn hardware(mut self, kind: HardwareKind) -> Self {
        self.hardware = Some(kind);
        self
    }

    pub fn iio_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.iio_root = Some(path.into());
        self
    }

    pub fn cpuinfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cpuinfo_path = Some(path.into());
        self
    }

    /// Set gateway listen address
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind = Some(addr.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Build and validate the settings
    pub fn build(self) -> Result<Settings, ConfigError> {
        let base = self.base.unwrap_or_default();

        let settings = Settings {
            device_name: self.device_name.unwrap_or(base.device_name),
            manifest_path: self.manifest_path.unwrap_or(base.manifest_path),
            database_path: self.database_path.unwrap_or(base.database_path),
            interval_secs: self.interval_secs.unwrap_or(base.interval_secs),
            hardware: self.hardware.unwrap_or(base.hardware),
            iio_root: self.iio_root.unwrap_or(base.iio_root),
            cpuinfo_path: self.cpuinfo_path.unwrap_or(base.cpuinfo_path),
            bind: self.bind.unwrap_or(base.bind),
            log_level: self.log_level.unwrap_or(base.log_level),
        };
        settings.validate()?;
        Ok(settings)
    }
}
