//! Device database information and status codes

use serde::{Deserialize, Serialize};

/// Status code returned by the driver's database query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbStatus {
    /// Query succeeded
    Ok,
    /// Invalid argument passed to the driver
    InvalidParam,
    /// Unspecified database failure
    General,
    /// Device is not present in the database
    NoDevice,
    /// Serial stored in the database does not match the device
    SerialMismatch,
    /// Calibration data is missing or corrupt
    CalibData,
}

impl DbStatus {
    /// All defined status codes, in code order
    pub const ALL: [DbStatus; 6] = [
        DbStatus::Ok,
        DbStatus::InvalidParam,
        DbStatus::General,
        DbStatus::NoDevice,
        DbStatus::SerialMismatch,
        DbStatus::CalibData,
    ];

    /// Map a raw driver code to a status, `None` for codes outside the defined set
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::InvalidParam),
            2 => Some(Self::General),
            3 => Some(Self::NoDevice),
            4 => Some(Self::SerialMismatch),
            5 => Some(Self::CalibData),
            _ => None,
        }
    }

    /// Raw driver code
    pub fn code(self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::InvalidParam => 1,
            Self::General => 2,
            Self::NoDevice => 3,
            Self::SerialMismatch => 4,
            Self::CalibData => 5,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidParam => "invalid parameter",
            Self::General => "general database error",
            Self::NoDevice => "device not found in database",
            Self::SerialMismatch => "serial number mismatch",
            Self::CalibData => "calibration data error",
        }
    }
}

impl std::fmt::Display for DbStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Test and calibration information stored for a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Production tests passed
    pub tests_ok: bool,
    /// Calibration passed
    pub calibration_ok: bool,
    /// Programming time, as reported by the driver
    pub prog_time: u32,
    /// Calibration time, as reported by the driver
    pub calib_time: u32,
}

impl DatabaseInfo {
    /// Device passed both tests and calibration
    pub fn is_ready(&self) -> bool {
        self.tests_ok && self.calibration_ok
    }
}
