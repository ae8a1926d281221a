//! Binding to the vendor RCDevices driver library
//!
//! The driver's exports take raw destination pointers with no length. Every
//! fill call here is preceded by a size probe and skipped when the
//! destination is too small, so a caller's slice is never overrun by a size
//! the driver reported up front. The driver may still change its answer
//! between the probe and the fill; nothing at this layer can prevent that.

use rcdevices_core::DeviceHandle;
use std::ptr;
use tracing::trace;

use crate::provider::{Provider, ProviderError, RawDatabaseInfo};

#[link(name = "RCDevices")]
extern "system" {
    #[link_name = "GetDeviceList"]
    fn get_device_list(list: *mut u32) -> u32;

    #[link_name = "GetDeviceMCUId"]
    fn get_device_mcu_id(handle: u32, id: *mut u8) -> u32;

    #[link_name = "GetDeviceSerial"]
    fn get_device_serial(handle: u32, serial: *mut u8) -> u32;

    #[link_name = "GetDeviceDatabaseInfo"]
    fn get_device_database_info(
        handle: u32,
        tests_ok: *mut u8,
        calibration_ok: *mut u8,
        prog_time: *mut u32,
        calib_time: *mut u32,
    ) -> u32;
}

/// The vendor driver, linked at build time
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDriver;

impl NativeDriver {
    pub fn new() -> Self {
        Self
    }
}

/// Probe, then fill only if the reported size fits in `out`
fn two_phase<T>(out: Option<&mut [T]>, call: impl Fn(*mut T) -> u32) -> u32 {
    let size = call(ptr::null_mut());
    match out {
        None => size,
        Some(buf) => {
            if size == 0 || size as usize > buf.len() {
                trace!(size = size, capacity = buf.len(), "Skipping fill");
                return size;
            }
            call(buf.as_mut_ptr())
        }
    }
}

impl Provider for NativeDriver {
    fn device_list(&self, out: Option<&mut [u32]>) -> Result<u32, ProviderError> {
        // SAFETY: null asks for the count; a non-null pointer is only passed
        // when the probed count fits the buffer
        Ok(two_phase(out, |p| unsafe { get_device_list(p) }))
    }

    fn mcu_id(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32 {
        // SAFETY: see device_list
        two_phase(out, |p| unsafe { get_device_mcu_id(handle.raw(), p) })
    }

    fn serial(&self, handle: DeviceHandle, out: Option<&mut [u8]>) -> u32 {
        // SAFETY: see device_list
        two_phase(out, |p| unsafe { get_device_serial(handle.raw(), p) })
    }

    fn database_info(&self, handle: DeviceHandle, out: &mut RawDatabaseInfo) -> u32 {
        // SAFETY: all four pointers come from live, exclusive borrows of `out`
        unsafe {
            get_device_database_info(
                handle.raw(),
                &mut out.tests_ok,
                &mut out.calibration_ok,
                &mut out.prog_time,
                &mut out.calib_time,
            )
        }
    }
}
