//! Domain model for the processes the module is loaded into.
//!
//! # Responsibility
//! - Define owned snapshots of host-provided specialization arguments.
//! - Keep target-process detection independent from JNI and the host ABI.
//!
//! # See also
//! - docs/architecture/lifecycle.md

pub mod process;
