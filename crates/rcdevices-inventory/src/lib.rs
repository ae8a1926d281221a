//! RCDevices Inventory - enumerate connected programmers and collect their data
//!
//! One [`DeviceRecord`](rcdevices_core::DeviceRecord) is built per handle the
//! driver reports. Each field is queried independently, so a device missing
//! calibration data still reports its serial and MCU id.

pub mod inventory;

pub use inventory::{Inventory, InventoryError};
