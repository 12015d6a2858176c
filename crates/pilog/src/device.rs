// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 pilog contributors

//! Device identity.
//!
//! The stable identifier is the board serial from `/proc/cpuinfo`. Startup
//! never fails on identity: well-known sentinels are substituted instead.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default location of the platform identity file.
pub const CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Identity used when the identity file has no `Serial` line.
pub const SERIAL_NOT_FOUND: &str = "0000000000000000";

/// Identity used when the identity file cannot be read.
pub const SERIAL_UNREADABLE: &str = "ERROR000000000";

/// Identity attached to every reading collected on this host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Stable hardware identity.
    pub device_id: String,
    /// Human label, may repeat across devices.
    pub device_name: String,
}

impl DeviceIdentity {
    pub fn new(device_id: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: device_name.into(),
        }
    }

    /// Build the identity from the platform identity file and a device name.
    pub fn detect(cpuinfo: &Path, device_name: impl Into<String>) -> Self {
        Self::new(read_serial(cpuinfo), device_name)
    }
}

/// Read the board serial number from a cpuinfo-style file.
///
/// Returns [`SERIAL_NOT_FOUND`] when no `Serial` line exists and
/// [`SERIAL_UNREADABLE`] when the file cannot be read.
pub fn read_serial(cpuinfo: &Path) -> String {
    tracing::debug!("Reading device serial from {}", cpuinfo.display());

    let content = match fs::read_to_string(cpuinfo) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Cannot read {}: {}", cpuinfo.display(), e);
            return SERIAL_UNREADABLE.to_string();
        }
    };

    parse_serial(&content).unwrap_or_else(|| SERIAL_NOT_FOUND.to_string())
}

fn parse_serial(content: &str) -> Option<String> {
    content
        .lines()
        .filter(|line| line.starts_with("Serial"))
        .filter_map(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .rfind(|value| !value.is_empty())
}

/// Get the system hostname, used as the default device name.
#[cfg(unix)]
pub fn hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY:
    // - buf is a valid mutable buffer of buf.len() bytes
    // - gethostname writes at most buf.len() bytes including the NUL terminator
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if ret != 0 {
        return None;
    }

    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..end]).into_owned();

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Get the system hostname (non-Unix).
#[cfg(not(unix))]
pub fn hostname() -> Option<String> {
    std::env::var("COMPUTERNAME").ok().filter(|h| !h.is_empty())
}
