//! RCDevices Driver - binding and query adapter for the RCDevices programmer driver
//!
//! The vendor driver exports four primitive operations. This crate puts them
//! behind the [`Provider`] trait and wraps the driver's two-phase
//! "ask size, allocate, fill" convention in safe functions that return owned
//! buffers.

pub mod provider;
pub mod query;
pub mod scripted;

#[cfg(feature = "native")]
pub mod native;

pub use provider::{Provider, ProviderError, RawDatabaseInfo};
pub use query::{query_fixed, query_variable, read_database_info, read_mcu_id, read_serial};
pub use scripted::{CallCounts, FixtureError, ScriptedDevice, ScriptedProvider};

#[cfg(feature = "native")]
pub use native::NativeDriver;
