//! Text and JSON rendering of device records

use chrono::{DateTime, Utc};
use rcdevices_core::{DatabaseInfo, DbStatus, DeviceHandle, DeviceRecord, QueryError};
use serde::Serialize;
use std::fmt::Write;

/// Database block of a device in JSON output
#[derive(Debug, Serialize)]
pub struct DbInfoJson {
    /// Raw driver status code, 0 on success
    pub result: u32,
    pub tests_ok: Option<bool>,
    pub calibration_ok: Option<bool>,
    pub prog_time: Option<u32>,
    pub calib_time: Option<u32>,
}

/// One device in JSON output; failed fields are `null`
#[derive(Debug, Serialize)]
pub struct DeviceJson {
    pub handle: u32,
    pub mcu_id: Option<Vec<u8>>,
    pub serial: Option<String>,
    pub db_info: DbInfoJson,
    pub ready: bool,
}

impl From<&DeviceRecord> for DeviceJson {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            handle: record.handle().raw(),
            mcu_id: record.mcu_id().map(<[u8]>::to_vec),
            serial: record.serial().map(str::to_string),
            db_info: DbInfoJson::from(record.database_result()),
            ready: record.is_ready(),
        }
    }
}

impl From<Result<&DatabaseInfo, &QueryError>> for DbInfoJson {
    fn from(database: Result<&DatabaseInfo, &QueryError>) -> Self {
        match database {
            Ok(db) => Self {
                result: DbStatus::Ok.code(),
                tests_ok: Some(db.tests_ok),
                calibration_ok: Some(db.calibration_ok),
                prog_time: Some(db.prog_time),
                calib_time: Some(db.calib_time),
            },
            Err(err) => Self {
                result: db_result_code(err),
                tests_ok: None,
                calibration_ok: None,
                prog_time: None,
                calib_time: None,
            },
        }
    }
}

/// Status code to report for a failed database query
fn db_result_code(err: &QueryError) -> u32 {
    match err {
        QueryError::Provider(code) => *code,
        // Variable-length query failures; the database query never yields these
        QueryError::Empty | QueryError::Resized { .. } | QueryError::InvalidText => {
            DbStatus::General.code()
        }
    }
}

#[derive(Debug, Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Wrap a successful payload in `{"success": true, ...}`
pub fn json_success<T: Serialize>(body: T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Envelope {
        success: true,
        body,
    })
}

/// `{"success": false, "error": "..."}`
pub fn json_failure(error: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Envelope {
        success: false,
        body: ErrorBody { error },
    })
}

#[derive(Debug, Serialize)]
pub struct ListBody {
    pub count: usize,
    pub devices: Vec<u32>,
}

#[derive(Debug, Serialize)]
pub struct InventoryBody {
    pub count: usize,
    pub scanned_at: DateTime<Utc>,
    pub devices: Vec<DeviceJson>,
}

impl InventoryBody {
    pub fn new(records: &[DeviceRecord], scanned_at: DateTime<Utc>) -> Self {
        Self {
            count: records.len(),
            scanned_at,
            devices: records.iter().map(DeviceJson::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionBody {
    pub version: &'static str,
    pub architecture: &'static str,
}

impl VersionBody {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            architecture: std::env::consts::ARCH,
        }
    }
}

/// MCU id line as printed by the vendor example
pub fn mcu_id_line(record: &DeviceRecord) -> String {
    match record.mcu_id_hex() {
        Some(hex) => format!(" MCU Id: {}", hex),
        None => " MCU Id: Error in GetDeviceMCUId()".to_string(),
    }
}

pub fn serial_line(record: &DeviceRecord) -> String {
    match record.serial() {
        Some(serial) => format!(" Serial: {}", serial),
        None => " Serial: Error in GetDeviceSerial()".to_string(),
    }
}

pub fn database_block(database: Result<&DatabaseInfo, &QueryError>) -> String {
    match database {
        Ok(db) => format!(
            " Tests Ok:   {}\n Calib Ok:   {}\n Prog  Time: {}\n Calib Time: {}",
            db.tests_ok as u8, db.calibration_ok as u8, db.prog_time, db.calib_time
        ),
        Err(err) => {
            let code = db_result_code(err);
            match DbStatus::from_code(code) {
                Some(status) => {
                    format!("Error {} in GetDeviceDatabaseInfo() ({})", code, status)
                }
                None => format!("Error {} in GetDeviceDatabaseInfo()", code),
            }
        }
    }
}

/// Full inventory in the vendor example's console layout
pub fn render_inventory_text(records: &[DeviceRecord]) -> String {
    if records.is_empty() {
        return "No devices found\n".to_string();
    }

    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(out, "--- Device #{}, handle = {} ---", i, record.handle());
        let _ = writeln!(out, "{}", mcu_id_line(record));
        let _ = writeln!(out, "{}", serial_line(record));
        let _ = writeln!(out, "{}", database_block(record.database_result()));
    }
    out
}

pub fn render_list_text(handles: &[DeviceHandle]) -> String {
    let mut out = format!("Found {} devices\n", handles.len());
    for (i, handle) in handles.iter().enumerate() {
        let _ = writeln!(out, "Device #{}: handle = {}", i, handle);
    }
    out
}

/// Single-device report with the READY / NOT READY / ERROR status line
pub fn render_single_text(record: &DeviceRecord) -> String {
    let mut out = String::from("=== Device Information ===\n");
    let _ = writeln!(out, "Handle: {}", record.handle());
    let _ = writeln!(out, "{}", mcu_id_line(record).trim_start());
    let _ = writeln!(out, "{}", serial_line(record).trim_start());

    let status = match record.database_result() {
        Ok(db) => {
            let _ = writeln!(out, "Tests OK: {}", db.tests_ok);
            let _ = writeln!(out, "Calibration OK: {}", db.calibration_ok);
            let _ = writeln!(out, "Program Time: {}", db.prog_time);
            let _ = writeln!(out, "Calibration Time: {}", db.calib_time);
            if db.is_ready() {
                "READY"
            } else {
                "NOT READY"
            }
        }
        Err(err) => {
            let _ = writeln!(out, "Database Error: {}", db_result_code(err));
            "ERROR"
        }
    };
    let _ = writeln!(out, "Status: {}", status);
    out
}
