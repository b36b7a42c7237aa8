//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with every project
//! option available as a flag (and most as the environment variable the build
//! system exports) so hooks can be driven without a configuration file.

use crate::context::{ArchiveDestination, HashPolicy};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Post-build hooks for RNode firmware
#[derive(Parser, Debug)]
#[command(
    name = "rnode_build_hooks",
    version,
    about = "Post-build hooks for RNode firmware: hash verification, provisioning and packaging",
    long_about = "Runs the firmware post-build pipeline for one lifecycle event.

The build system calls this binary around upload and clean actions, and for the
custom `package` target. Project options come from rnode_build.toml in the
project directory, overridden by flags and environment variables.

Usage:
  rnode_build_hooks --board ttgo-t-beam --upload-port /dev/ttyACM0 post-upload
  rnode_build_hooks --variant tbeam package
  rnode_build_hooks verify .pio/build/tbeam/firmware.bin

Exit code 0 = every step succeeded, 1 = a step failed, 2 = an external tool failed."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Project root (where rnode_build.toml lives)
    #[arg(long, global = true, env = "PROJECT_DIR", value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Configuration file (default: <project-dir>/rnode_build.toml)
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Target platform, e.g. espressif32 or nordicnrf52
    #[arg(long, global = true, env = "PLATFORM")]
    pub platform: Option<String>,

    /// Board identifier
    #[arg(long, global = true, env = "BOARD")]
    pub board: Option<String>,

    /// Build variant used in artifact names (defaults to the board)
    #[arg(long, global = true, env = "VARIANT")]
    pub variant: Option<String>,

    /// Serial port of the attached device
    #[arg(long, global = true, env = "UPLOAD_PORT", value_name = "PORT")]
    pub upload_port: Option<String>,

    /// Build output directory
    #[arg(long, global = true, env = "BUILD_DIR", value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Build system core directory
    #[arg(long, global = true, env = "CORE_DIR", value_name = "DIR")]
    pub core_dir: Option<PathBuf>,

    /// Installed packages directory
    #[arg(long, global = true, env = "PACKAGES_DIR", value_name = "DIR")]
    pub packages_dir: Option<PathBuf>,

    /// Project release directory
    #[arg(long, global = true, value_name = "DIR")]
    pub release_dir: Option<PathBuf>,

    /// Seconds to wait after upload before talking to the device
    #[arg(long, global = true, value_name = "SECS")]
    pub settle_delay: Option<u64>,

    /// Provisioning tool to run
    #[arg(long, global = true, value_name = "PROGRAM")]
    pub provisioning_tool: Option<String>,

    /// Provision device identity after upload
    #[arg(long, global = true)]
    pub enable_provisioning: bool,

    /// Build the release archive after upload
    #[arg(long, global = true)]
    pub enable_post_upload_packaging: bool,

    /// What a failed hash check means: advisory or enforce
    #[arg(long, global = true, value_parser = parse_hash_policy)]
    pub hash_policy: Option<HashPolicy>,

    /// Where to write the archive: build or release
    #[arg(long, global = true, value_parser = parse_archive_destination)]
    pub archive_destination: Option<ArchiveDestination>,

    /// Print the phase report as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

/// Subcommands, one per lifecycle event plus operator tools.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Before the device is flashed
    PreUpload,
    /// After the device is flashed
    PostUpload {
        /// Flashed image (default: <build-dir>/firmware.bin)
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// After a clean action
    PostClean,
    /// Package firmware for delivery
    Package,
    /// Check an image's footer hash without touching the device
    Verify {
        /// Firmware image
        image: PathBuf,
    },
    /// Write product/model/hwrev to the attached device
    Provision,
    /// Print the custom targets the build system should register
    Targets,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency.
    ///
    /// Board, variant and the other file-name parts are checked when the
    /// context is built, whatever their source.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(platform) = &self.platform {
            if platform.trim().is_empty() {
                return Err("Platform cannot be empty".to_string());
            }
        }

        Ok(())
    }
}

fn parse_hash_policy(s: &str) -> Result<HashPolicy, String> {
    match s {
        "advisory" => Ok(HashPolicy::Advisory),
        "enforce" => Ok(HashPolicy::Enforce),
        _ => Err(format!("Invalid hash policy: {}. Valid: advisory, enforce", s)),
    }
}

fn parse_archive_destination(s: &str) -> Result<ArchiveDestination, String> {
    match s {
        "build" => Ok(ArchiveDestination::Build),
        "release" => Ok(ArchiveDestination::Release),
        _ => Err(format!("Invalid archive destination: {}. Valid: build, release", s)),
    }
}
