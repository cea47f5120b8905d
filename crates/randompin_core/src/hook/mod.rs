//! Hook planning for the processes the module targets.
//!
//! The plan only names interception points; installing them is the job of the
//! host-side crate.

pub mod plan;

pub use plan::{HookPhase, HookPlan, HookPurpose, HookSignature, HookTarget};
