//! In-memory provider driven by a fixed device script
//!
//! Used as a stand-in for the vendor driver when no hardware is attached and
//! as the test double for the adapter and the inventory. Scripts can be
//! built in code or loaded from a TOML fixture:
//!
//! ```toml
//! [[device]]
//! handle = 0x10
//! mcu_id = [0xAA, 0xBB]
//! serial = "SN001"
//! tests_ok = true
//! calibration_ok = true
//! prog_time = 120
//! calib_time = 45
//!
//! [[device]]
//! handle = 0x20
//! serial = "SN002"
//! db_status = 3
//! ```

use rcdevices_core::{DatabaseInfo, DbStatus, DeviceHandle};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::path::Path;
use thiserror::Error;
use tracing::{info, trace};

use crate::provider::{Provider, ProviderError, RawDatabaseInfo};

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("failed to read fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid fixture: {0}")]
    Toml(#[from] toml::de::Error),
}

/// One scripted device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedDevice {
    pub handle: DeviceHandle,
    /// Missing or empty means the driver reports size 0
    #[serde(default)]
    pub mcu_id: Option<Vec<u8>>,
    /// Missing means the driver reports size 0
    #[serde(default)]
    pub serial: Option<String>,
    /// Raw status code for the database query
    #[serde(default)]
    pub db_status: u32,
    #[serde(default)]
    pub tests_ok: bool,
    #[serde(default)]
    pub calibration_ok: bool,
    #[serde(default)]
    pub prog_time: u32,
    #[serde(default)]
    pub calib_time: u32,
}

impl ScriptedDevice {
    /// A device with no data: every variable-length query is empty and the
    /// database lookup reports `NoDevice`
    pub fn new(handle: u32) -> Self {
        Self {
            handle: DeviceHandle(handle),
            mcu_id: None,
            serial: None,
            db_status: DbStatus::NoDevice.code(),
            tests_ok: false,
            calibration_ok: false,
            prog_time: 0,
            calib_time: 0,
        }
    }

    pub fn with_mcu_id(mut self, mcu_id: &[u8]) -> Self {
        self.mcu_id = Some(mcu_id.to_vec());
        self
    }

    pub fn with_serial(mut self, serial: &str) -> Self {
        self.serial = Some(serial.to_string());
        self
    }

    pub fn with_database(mut self, info: DatabaseInfo) -> Self {
        self.db_status = DbStatus::Ok.code();
        self.tests_ok = info.tests_ok;
        self.calibration_ok = info.calibration_ok;
        self.prog_time = info.prog_time;
        self.calib_time = info.calib_time;
        self
    }

    pub fn with_db_status(mut self, code: u32) -> Self {
        self.db_status = code;
        self
    }

    /// Serial as the driver writes it: the text followed by a NUL
    fn serial_bytes(&self) -> Option<Vec<u8>> {
        self.serial.as_ref().map(|s| {
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            bytes
        })
    }
}

/// Number of provider calls made, split into probes (no destination) and fills
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_probes: u32,
    pub list_fills: u32,
    pub mcu_id_probes: u32,
    pub mcu_id_fills: u32,
    pub serial_probes: u32,
    pub serial_fills: u32,
    pub database_queries: u32,
}

#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    unreachable: bool,
    #[serde(default, rename = "device")]
    devices: Vec<ScriptedDevice>,
}

/// Provider answering from a fixed list of devices
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    devices: Vec<ScriptedDevice>,
    unreachable: bool,
    calls: Cell<CallCounts>,
}

impl ScriptedProvider {
    pub fn new(devices: Vec<ScriptedDevice>) -> Self {
        Self {
            devices,
            unreachable: false,
            calls: Cell::new(CallCounts::default()),
        }
    }

    /// A provider whose device list query always fails
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Parse a TOML fixture
    pub fn from_toml_str(content: &str) -> Result<Self, FixtureError> {
        let fixture: Fixture = toml::from_str(content)?;
        Ok(Self {
            devices: fixture.devices,
            unreachable: fixture.unreachable,
            calls: Cell::new(CallCounts::default()),
        })
    }

    /// Load a TOML fixture from disk
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        let provider = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            devices = provider.devices.len(),
            "Loaded device fixture"
        );
        Ok(provider)
    }

    pub fn devices(&self) -> &[ScriptedDevice] {
        &self.devices
    }

    /// Calls made so far
    pub fn calls(&self) -> CallCounts {
        self.calls.get()
    }

    fn record(&self, update: impl FnOnce(&mut CallCounts)) {
        let mut calls = self.calls.get();
        update(&mut calls);
        self.calls.set(calls);
    }

    fn find(&self, handle: DeviceHandle) -> Option<&ScriptedDevice> {
        self.devices.iter().find(|d| d.handle == handle)
    }
}

/// Two-phase answer: report `data.len()`, copy only when `out` is large enough
fn answer<T: Copy>(data: &[T], out: Option<&mut [T]>) -> u32 {
    if let Some(buf) = out {
        if data.len() <= buf.len() {
            buf[..data.len()].copy_from_slice(data);
        }
    }
    data.len() as u32
}

impl Provider for ScriptedProvider {
    fn device_list(&self, out: Option<&mut [u32]>) -> Result<u32, ProviderError> {
        if self.unreachable {
            return Err(ProviderError::Unavailable(
                "scripted driver is unreachable".to_string(),
            ));
        }
        match out {
            None => self.record(|c| c.list_probes += 1),
            Some(_) => self.record(|c| c.list_fills += 1),
        }
        let handles: Vec<u32> = self.devices.iter().map(|d| d.handle.raw()).collect();
        Ok(answer(&handles, out))
    }

    fn mcu_id(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32 {
        match out {
            None => self.record(|c| c.mcu_id_probes += 1),
            Some(_) => self.record(|c| c.mcu_id_fills += 1),
        }
        let data = self
            .find(handle)
            .and_then(|d| d.mcu_id.clone())
            .unwrap_or_default();
        trace!(handle = %handle, size = data.len(), "Scripted MCU id");
        answer(&data, out)
    }

    fn serial(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32 {
        match out {
            None => self.record(|c| c.serial_probes += 1),
            Some(_) => self.record(|c| c.serial_fills += 1),
        }
        let data = self
            .find(handle)
            .and_then(ScriptedDevice::serial_bytes)
            .unwrap_or_default();
        trace!(handle = %handle, size = data.len(), "Scripted serial");
        answer(&data, out)
    }

    fn database_info(&self, handle: DeviceHandle, out: &mut RawDatabaseInfo) -> u32 {
        self.record(|c| c.database_queries += 1);
        let Some(device) = self.find(handle) else {
            return DbStatus::InvalidParam.code();
        };
        *out = RawDatabaseInfo {
            tests_ok: device.tests_ok as u8,
            calibration_ok: device.calibration_ok as u8,
            prog_time: device.prog_time,
            calib_time: device.calib_time,
        };
        device.db_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FIXTURE: &str = r#"
[[device]]
handle = 0x10
mcu_id = [0xAA, 0xBB]
serial = "SN001"
tests_ok = true
calibration_ok = true
prog_time = 120
calib_time = 45

[[device]]
handle = 0x20
serial = "SN002"
db_status = 3
"#;

    #[test]
    fn test_parse_fixture() {
        let provider = ScriptedProvider::from_toml_str(FIXTURE).unwrap();
        let devices = provider.devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].handle, DeviceHandle(0x10));
        assert_eq!(devices[0].mcu_id.as_deref(), Some(&[0xAA, 0xBB][..]));
        assert_eq!(devices[0].db_status, 0);
        assert_eq!(devices[1].mcu_id, None);
        assert_eq!(devices[1].db_status, 3);
    }

    #[test]
    fn test_load_fixture_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let provider = ScriptedProvider::load(file.path()).unwrap();
        assert_eq!(provider.devices().len(), 2);
    }

    #[test]
    fn test_unreachable_fixture() {
        let provider = ScriptedProvider::from_toml_str("unreachable = true").unwrap();
        assert!(provider.device_list(None).is_err());
    }

    #[test]
    fn test_invalid_fixture() {
        let err = ScriptedProvider::from_toml_str("[[device]]\nhandle = \"x\"").unwrap_err();
        assert!(matches!(err, FixtureError::Toml(_)));
    }

    #[test]
    fn test_two_phase_list() {
        let provider = ScriptedProvider::from_toml_str(FIXTURE).unwrap();
        assert_eq!(provider.device_list(None), Ok(2));

        let mut buf = [0u32; 2];
        assert_eq!(provider.device_list(Some(&mut buf)), Ok(2));
        assert_eq!(buf, [0x10, 0x20]);

        let calls = provider.calls();
        assert_eq!(calls.list_probes, 1);
        assert_eq!(calls.list_fills, 1);
    }

    #[test]
    fn test_short_buffer_is_left_untouched() {
        let provider = ScriptedProvider::new(vec![ScriptedDevice::new(1).with_mcu_id(&[1, 2, 3])]);
        let mut buf = [0u8; 2];
        assert_eq!(provider.mcu_id(DeviceHandle(1), Some(&mut buf)), 3);
        assert_eq!(buf, [0, 0]);
    }

    #[test]
    fn test_serial_is_nul_terminated() {
        let provider = ScriptedProvider::new(vec![ScriptedDevice::new(1).with_serial("AB")]);
        let mut buf = [0xFFu8; 3];
        assert_eq!(provider.serial(DeviceHandle(1), None), 3);
        assert_eq!(provider.serial(DeviceHandle(1), Some(&mut buf)), 3);
        assert_eq!(buf, [b'A', b'B', 0]);
    }

    #[test]
    fn test_unknown_handle() {
        let provider = ScriptedProvider::new(vec![]);
        let mut raw = RawDatabaseInfo::default();
        assert_eq!(provider.mcu_id(DeviceHandle(9), None), 0);
        assert_eq!(provider.serial(DeviceHandle(9), None), 0);
        assert_eq!(
            provider.database_info(DeviceHandle(9), &mut raw),
            DbStatus::InvalidParam.code()
        );
    }
}
