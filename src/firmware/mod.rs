//! Firmware image checks and device-side updates.
//!
//! - [`hash`] - footer hash verification and propagation to the device
//! - [`provision`] - product/model/hardware-revision provisioning

pub mod hash;
pub mod provision;

/// Size of the SHA-256 footer at the end of a firmware image.
pub const FOOTER_LEN: usize = 32;

pub use hash::{HashReport, Verification, verify_and_propagate, verify_file, verify_image};
pub use provision::{ProvisionResult, provision};
