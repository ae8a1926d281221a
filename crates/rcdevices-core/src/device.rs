//! Device handle and per-device record types

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::database::DatabaseInfo;
use crate::error::QueryError;

/// Opaque handle identifying one connected device
///
/// Handles are handed out by the driver and only mean something as an
/// argument to later queries in the same driver session. The driver owns the
/// device lifetime, so a handle is a plain value with nothing to release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceHandle(pub u32);

impl DeviceHandle {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for DeviceHandle {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid device handle '{0}': expected a hex number such as 0x1A2B")]
pub struct ParseHandleError(pub String);

impl FromStr for DeviceHandle {
    type Err = ParseHandleError;

    /// Parse a hex handle, with or without a `0x` prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseHandleError(s.to_string()))
    }
}

/// Space-separated upper-case hex pairs, e.g. `AA BB 0C`
pub fn format_mcu_id(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything queried from one device during an enumeration pass
///
/// Each field holds either its value or the error that prevented it, never
/// both. A record is built once with all three outcomes and is not modified
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    handle: DeviceHandle,
    mcu_id: Result<Vec<u8>, QueryError>,
    serial: Result<String, QueryError>,
    database: Result<DatabaseInfo, QueryError>,
}

impl DeviceRecord {
    pub fn new(
        handle: DeviceHandle,
        mcu_id: Result<Vec<u8>, QueryError>,
        serial: Result<String, QueryError>,
        database: Result<DatabaseInfo, QueryError>,
    ) -> Self {
        Self {
            handle,
            mcu_id,
            serial,
            database,
        }
    }

    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    /// Raw hardware MCU identifier
    pub fn mcu_id(&self) -> Option<&[u8]> {
        self.mcu_id.as_deref().ok()
    }

    pub fn mcu_id_error(&self) -> Option<&QueryError> {
        self.mcu_id.as_ref().err()
    }

    /// MCU identifier formatted with [`format_mcu_id`]
    pub fn mcu_id_hex(&self) -> Option<String> {
        self.mcu_id().map(format_mcu_id)
    }

    /// Human-readable serial number
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref().ok()
    }

    pub fn serial_error(&self) -> Option<&QueryError> {
        self.serial.as_ref().err()
    }

    /// Database information, absent when the combined query failed
    pub fn database(&self) -> Option<&DatabaseInfo> {
        self.database.as_ref().ok()
    }

    pub fn database_error(&self) -> Option<&QueryError> {
        self.database.as_ref().err()
    }

    /// Database outcome as recorded, value or error
    pub fn database_result(&self) -> Result<&DatabaseInfo, &QueryError> {
        self.database.as_ref()
    }

    pub fn tests_ok(&self) -> Option<bool> {
        self.database().map(|db| db.tests_ok)
    }

    pub fn calibration_ok(&self) -> Option<bool> {
        self.database().map(|db| db.calibration_ok)
    }

    pub fn prog_time(&self) -> Option<u32> {
        self.database().map(|db| db.prog_time)
    }

    pub fn calib_time(&self) -> Option<u32> {
        self.database().map(|db| db.calib_time)
    }

    /// Device passed tests and calibration. False when the database query failed.
    pub fn is_ready(&self) -> bool {
        self.database().map(DatabaseInfo::is_ready).unwrap_or(false)
    }

    /// Every field was queried successfully
    pub fn is_complete(&self) -> bool {
        self.mcu_id.is_ok() && self.serial.is_ok() && self.database.is_ok()
    }
}
