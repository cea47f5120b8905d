//! Zygisk binding for the RandomPIN module.
//!
//! # Responsibility
//! - Export `zygisk_module_entry` and register the module with the host.
//! - Bridge host callbacks and JNI values into `randompin_core` types.
//!
//! # Invariants
//! - Exported functions must not unwind across the FFI boundary.
//! - Host-owned memory is never freed or retained past its callback.

pub mod abi;
pub mod api;
pub mod args;
mod entry;
pub mod module;

pub use api::{HostApi, HostError, ZygiskApi};
pub use entry::zygisk_module_entry;
pub use module::RandomPinModule;
