//! Inventory aggregator that combines the per-device queries

use rcdevices_core::{DeviceHandle, DeviceRecord};
use rcdevices_driver::{read_database_info, read_mcu_id, read_serial, Provider, ProviderError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fill attempts made by [`Inventory::enumerate`] while the device list grows
pub const LIST_ATTEMPTS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("No devices found. Check connection and drivers.")]
    NoDevices,
    #[error("Multiple devices found ({0}). Only single device mode supported.")]
    MultipleDevices(usize),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Enumerates devices through a provider and builds their records
///
/// Holds no state besides the provider: every call re-queries the driver, so
/// results always reflect the hardware currently attached.
pub struct Inventory<P> {
    provider: P,
}

impl<P: Provider> Inventory<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// List the handles of all visible devices, in driver order
    ///
    /// Zero devices is a normal result. The only error is the driver itself
    /// failing. Devices plugged in between the count and the fill make the
    /// fill report a larger count with nothing written, so the fill is
    /// retried with the larger buffer up to [`LIST_ATTEMPTS`] times.
    pub fn enumerate(&self) -> Result<Vec<DeviceHandle>, ProviderError> {
        let mut capacity = self.provider.device_list(None)?;

        for attempt in 1..=LIST_ATTEMPTS {
            if capacity == 0 {
                debug!("No devices attached");
                return Ok(Vec::new());
            }

            let mut raw = vec![0u32; capacity as usize];
            let reported = self.provider.device_list(Some(&mut raw))?;
            if reported <= capacity {
                if reported < capacity {
                    // Devices were unplugged between the two calls
                    debug!(probed = capacity, reported = reported, "Device list shrank");
                    raw.truncate(reported as usize);
                }
                debug!(count = raw.len(), "Enumerated devices");
                return Ok(raw.into_iter().map(DeviceHandle).collect());
            }

            debug!(
                attempt = attempt,
                probed = capacity,
                reported = reported,
                "Device list grew during enumeration, retrying"
            );
            capacity = reported;
        }

        warn!(
            attempts = LIST_ATTEMPTS,
            "Device list kept growing during enumeration, no handles read"
        );
        Ok(Vec::new())
    }

    /// Query everything about one device
    ///
    /// The three queries run in order and independently; a failure is stored
    /// in its own field and never skips the others.
    pub fn build_record(&self, handle: DeviceHandle) -> DeviceRecord {
        let mcu_id = read_mcu_id(&self.provider, handle);
        if let Err(e) = &mcu_id {
            warn!(handle = %handle, error = %e, "MCU id query failed");
        }

        let serial = read_serial(&self.provider, handle);
        if let Err(e) = &serial {
            warn!(handle = %handle, error = %e, "Serial query failed");
        }

        let database = read_database_info(&self.provider, handle);
        if let Err(e) = &database {
            warn!(
                handle = %handle,
                error = %e,
                status = ?e.status(),
                "Database info query failed"
            );
        }

        DeviceRecord::new(handle, mcu_id, serial, database)
    }

    /// Build one record per enumerated device, preserving driver order
    pub fn build_inventory(&self) -> Result<Vec<DeviceRecord>, ProviderError> {
        let handles = self.enumerate()?;
        let records: Vec<DeviceRecord> = handles
            .into_iter()
            .map(|handle| self.build_record(handle))
            .collect();

        info!(
            devices = records.len(),
            complete = records.iter().filter(|r| r.is_complete()).count(),
            "Inventory built"
        );
        Ok(records)
    }

    /// Record of the only attached device
    ///
    /// Fails when no device or more than one device is attached.
    pub fn single_device(&self) -> Result<DeviceRecord, InventoryError> {
        let handles = self.enumerate()?;
        match handles.as_slice() {
            [] => Err(InventoryError::NoDevices),
            [handle] => Ok(self.build_record(*handle)),
            _ => Err(InventoryError::MultipleDevices(handles.len())),
        }
    }
}
