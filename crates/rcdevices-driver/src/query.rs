//! Typed queries over the driver's calling conventions

use rcdevices_core::{DatabaseInfo, DeviceHandle, QueryError};
use tracing::{debug, trace};

use crate::provider::{Provider, RawDatabaseInfo};

/// Run a two-phase variable-length query
///
/// `probe` is the driver call with no destination and returns the element
/// count. `fill` is the same call with a destination of exactly that size.
/// The returned buffer always has the probed length; on any failure no
/// buffer is returned at all.
pub fn query_variable<T, P, F>(
    handle: DeviceHandle,
    probe: P,
    fill: F,
) -> Result<Vec<T>, QueryError>
where
    T: Default + Clone,
    P: FnOnce(DeviceHandle) -> u32,
    F: FnOnce(DeviceHandle, &mut [T]) -> u32,
{
    let probed = probe(handle);
    if probed == 0 {
        return Err(QueryError::Empty);
    }

    let mut buf = vec![T::default(); probed as usize];
    let filled = fill(handle, &mut buf);
    trace!(handle = %handle, probed = probed, filled = filled, "Two-phase query");

    match filled {
        0 => Err(QueryError::Empty),
        n if n != probed => Err(QueryError::Resized { probed, filled: n }),
        _ => Ok(buf),
    }
}

/// Run the fixed-size database query
///
/// Status 0 is success. Any other status is returned as
/// [`QueryError::Provider`] with the raw code, and whatever the driver wrote
/// into the out-parameters is dropped.
pub fn query_fixed<Q>(handle: DeviceHandle, query: Q) -> Result<DatabaseInfo, QueryError>
where
    Q: FnOnce(DeviceHandle, &mut RawDatabaseInfo) -> u32,
{
    let mut raw = RawDatabaseInfo::default();
    match query(handle, &mut raw) {
        0 => Ok(raw.into()),
        code => Err(QueryError::Provider(code)),
    }
}

/// Read the hardware MCU identifier
pub fn read_mcu_id<P: Provider + ?Sized>(
    provider: &P,
    handle: DeviceHandle,
) -> Result<Vec<u8>, QueryError> {
    let id = query_variable(
        handle,
        |h| provider.mcu_id(h, None),
        |h, buf| provider.mcu_id(h, Some(buf)),
    )?;
    debug!(handle = %handle, len = id.len(), "Read MCU id");
    Ok(id)
}

/// Read the human-readable serial number
///
/// The driver writes a C string; everything from the first NUL on is dropped.
pub fn read_serial<P: Provider + ?Sized>(
    provider: &P,
    handle: DeviceHandle,
) -> Result<String, QueryError> {
    let mut bytes = query_variable(
        handle,
        |h| provider.serial(h, None),
        |h, buf| provider.serial(h, Some(buf)),
    )?;
    if let Some(nul) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(nul);
    }
    let serial = String::from_utf8(bytes).map_err(|_| QueryError::InvalidText)?;
    debug!(handle = %handle, serial = %serial, "Read serial");
    Ok(serial)
}

/// Read test and calibration information from the device database
pub fn read_database_info<P: Provider + ?Sized>(
    provider: &P,
    handle: DeviceHandle,
) -> Result<DatabaseInfo, QueryError> {
    let info = query_fixed(handle, |h, raw| provider.database_info(h, raw))?;
    debug!(
        handle = %handle,
        tests_ok = info.tests_ok,
        calibration_ok = info.calibration_ok,
        "Read database info"
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{ScriptedDevice, ScriptedProvider};
    use rcdevices_core::DbStatus;
    use std::cell::Cell;

    const H: DeviceHandle = DeviceHandle(0x10);

    #[test]
    fn test_variable_returns_probed_length() {
        for n in [1u32, 2, 7, 64] {
            let buf = query_variable(
                H,
                |_| n,
                |_, buf: &mut [u8]| {
                    buf.fill(0x5A);
                    buf.len() as u32
                },
            )
            .unwrap();
            assert_eq!(buf.len(), n as usize);
            assert!(buf.iter().all(|&b| b == 0x5A));
        }
    }

    #[test]
    fn test_variable_empty_probe_skips_fill() {
        let fills = Cell::new(0);
        let result = query_variable(
            H,
            |_| 0,
            |_, _: &mut [u8]| {
                fills.set(fills.get() + 1);
                4
            },
        );
        assert_eq!(result, Err(QueryError::Empty));
        assert_eq!(fills.get(), 0);
    }

    #[test]
    fn test_variable_fill_failure() {
        let result = query_variable(H, |_| 4, |_, _: &mut [u8]| 0);
        assert_eq!(result, Err(QueryError::Empty));
    }

    #[test]
    fn test_variable_size_changed() {
        let result = query_variable(H, |_| 4, |_, _: &mut [u8]| 6);
        assert_eq!(
            result,
            Err(QueryError::Resized {
                probed: 4,
                filled: 6
            })
        );

        let result = query_variable(H, |_| 4, |_, _: &mut [u8]| 3);
        assert_eq!(
            result,
            Err(QueryError::Resized {
                probed: 4,
                filled: 3
            })
        );
    }

    #[test]
    fn test_fixed_status_mapping() {
        for status in DbStatus::ALL {
            let result = query_fixed(H, |_, raw| {
                raw.tests_ok = 1;
                raw.prog_time = 7;
                status.code()
            });
            match status {
                DbStatus::Ok => {
                    let info = result.unwrap();
                    assert!(info.tests_ok);
                    assert_eq!(info.prog_time, 7);
                }
                _ => assert_eq!(result, Err(QueryError::Provider(status.code()))),
            }
        }
    }

    #[test]
    fn test_fixed_unknown_code_is_preserved() {
        let result = query_fixed(H, |_, _| 77);
        assert_eq!(result, Err(QueryError::Provider(77)));
    }

    #[test]
    fn test_read_helpers_against_scripted_driver() {
        let provider = ScriptedProvider::new(vec![ScriptedDevice::new(0x10)
            .with_mcu_id(&[0xAA, 0xBB])
            .with_serial("SN001")
            .with_database(DatabaseInfo {
                tests_ok: true,
                calibration_ok: false,
                prog_time: 120,
                calib_time: 45,
            })]);

        assert_eq!(read_mcu_id(&provider, H), Ok(vec![0xAA, 0xBB]));
        assert_eq!(read_serial(&provider, H), Ok("SN001".to_string()));

        let info = read_database_info(&provider, H).unwrap();
        assert!(info.tests_ok);
        assert!(!info.calibration_ok);
        assert_eq!(info.calib_time, 45);

        let calls = provider.calls();
        assert_eq!(calls.mcu_id_probes, 1);
        assert_eq!(calls.mcu_id_fills, 1);
        assert_eq!(calls.serial_probes, 1);
        assert_eq!(calls.serial_fills, 1);
        assert_eq!(calls.database_queries, 1);
    }

    /// Driver that writes a Latin-1 style serial
    struct RawSerialDriver(&'static [u8]);

    impl Provider for RawSerialDriver {
        fn device_list(&self, _: Option<&mut [u32]>) -> Result<u32, crate::ProviderError> {
            Ok(0)
        }

        fn mcu_id(&self, _: DeviceHandle, _: Option<&mut [u8]>) -> u32 {
            0
        }

        fn serial(&self, _: DeviceHandle, out: Option<&mut [u8]>) -> u32 {
            if let Some(buf) = out {
                buf.copy_from_slice(self.0);
            }
            self.0.len() as u32
        }

        fn database_info(&self, _: DeviceHandle, _: &mut RawDatabaseInfo) -> u32 {
            DbStatus::General.code()
        }
    }

    #[test]
    fn test_serial_invalid_utf8() {
        let driver = RawSerialDriver(&[b'S', 0xD1, b'N', 0]);
        assert_eq!(read_serial(&driver, H), Err(QueryError::InvalidText));
    }

    #[test]
    fn test_serial_stops_at_first_nul() {
        let driver = RawSerialDriver(b"SN9\0junk");
        assert_eq!(read_serial(&driver, H), Ok("SN9".to_string()));
    }

    #[test]
    fn test_empty_serial_string() {
        let provider = ScriptedProvider::new(vec![ScriptedDevice::new(0x10).with_serial("")]);
        assert_eq!(read_serial(&provider, H), Ok(String::new()));
    }
}
