//! Build context handed to every hook.
//!
//! The host build system's ambient state (project options, directory
//! variables, upload port) is captured once per invocation into an immutable
//! [`BuildContext`], together with the platform capability table and the
//! feature flags that gate optional steps.

mod builder;
mod core;
mod features;
mod platform;

pub use builder::{
    BuildContextBuilder, DEFAULT_PRODUCT_PREFIX, DEFAULT_PROGRAM_NAME, DEFAULT_PROVISIONING_TOOL,
    DEFAULT_SETTLE_DELAY, expand_home, resolve_path,
};
pub use self::core::BuildContext;
pub use features::{ArchiveDestination, Features, HashPolicy};
pub use platform::{Capabilities, Platform, ProvisionIdentity};
