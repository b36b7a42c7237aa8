//! Firmware post-build pipeline for RNode devices.
//!
//! This library provides the steps the build system runs around upload,
//! clean and packaging:
//! - Footer hash verification of ESP32 images and propagation to the device
//! - Device identity provisioning through an external tool
//! - Release packaging of a variant's build outputs into one archive
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod firmware;
pub mod invoker;
pub mod lifecycle;
pub mod package;

// Re-export commonly used types
pub use error::{CliError, PipelineError, Result};
