//! The four primitive driver operations

use rcdevices_core::{DatabaseInfo, DeviceHandle};
use thiserror::Error;

/// The driver itself could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("driver unavailable: {0}")]
    Unavailable(String),
}

/// Out-parameters of the database query, exactly as the driver fills them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawDatabaseInfo {
    pub tests_ok: u8,
    pub calibration_ok: u8,
    pub prog_time: u32,
    pub calib_time: u32,
}

impl From<RawDatabaseInfo> for DatabaseInfo {
    fn from(raw: RawDatabaseInfo) -> Self {
        Self {
            tests_ok: raw.tests_ok != 0,
            calibration_ok: raw.calibration_ok != 0,
            prog_time: raw.prog_time,
            calib_time: raw.calib_time,
        }
    }
}

/// Source of device data, normally the vendor driver
///
/// The variable-length operations follow the driver's two-phase convention.
/// With `out == None` they return the required element count and write
/// nothing. With `out == Some(buf)` they return the driver's current size
/// and write it into `buf`, but only if it fits: when the size exceeds
/// `buf.len()` nothing is written and the larger size is returned. A return
/// of zero means "no data or error"; the driver does not distinguish them.
pub trait Provider {
    /// Number of visible devices, or fill `out` with their handles
    fn device_list(&self, out: Option<&mut [u32]>) -> Result<u32, ProviderError>;

    /// Raw MCU identifier bytes
    fn mcu_id(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32;

    /// Serial string bytes, NUL-terminated as the driver writes them
    fn serial(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32;

    /// Test/calibration info. Returns a database status code, 0 on success.
    /// `out` is only meaningful when the status is 0.
    fn database_info(&self, handle: DeviceHandle, out: &mut RawDatabaseInfo) -> u32;
}

impl<P: Provider + ?Sized> Provider for &P {
    fn device_list(&self, out: Option<&mut [u32]>) -> Result<u32, ProviderError> {
        (**self).device_list(out)
    }

    fn mcu_id(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32 {
        (**self).mcu_id(handle, out)
    }

    fn serial(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32 {
        (**self).serial(handle, out)
    }

    fn database_info(&self, handle: DeviceHandle, out: &mut RawDatabaseInfo) -> u32 {
        (**self).database_info(handle, out)
    }
}

impl<P: Provider + ?Sized> Provider for Box<P> {
    fn device_list(&self, out: Option<&mut [u32]>) -> Result<u32, ProviderError> {
        (**self).device_list(out)
    }

    fn mcu_id(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32 {
        (**self).mcu_id(handle, out)
    }

    fn serial(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32 {
        (**self).serial(handle, out)
    }

    fn database_info(&self, handle: DeviceHandle, out: &mut RawDatabaseInfo) -> u32 {
        (**self).database_info(handle, out)
    }
}
