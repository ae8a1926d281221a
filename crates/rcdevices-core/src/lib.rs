//! RCDevices Core - Core types for programmer device queries
//!
//! This crate provides the foundational types shared by the driver adapter,
//! the inventory aggregator and the command-line front end:
//! - Opaque device handles as handed out by the driver
//! - Database status codes and calibration/test information
//! - Per-field query errors
//! - The aggregated per-device record

pub mod database;
pub mod device;
pub mod error;

pub use database::{DatabaseInfo, DbStatus};
pub use device::{format_mcu_id, DeviceHandle, DeviceRecord, ParseHandleError};
pub use error::QueryError;
