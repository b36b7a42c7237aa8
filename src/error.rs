//! Error types for post-build pipeline operations.
//!
//! This module defines the error taxonomy shared by every phase: malformed
//! images, hash mismatches, missing artifacts and external command failures,
//! plus the I/O, parsing and archive errors they are built on.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO error annotated with the operation and path involved
    #[error("{operation} {}: {source}", path.display())]
    Fs {
        /// What was being done
        operation: &'static str,
        /// Path the operation touched
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Archive writer errors
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Image too short to hold the trailing hash footer
    #[error(
        "Malformed firmware image {}: {len} bytes, need at least {} for the hash footer",
        path.display(),
        crate::firmware::FOOTER_LEN
    )]
    MalformedImage {
        /// Image path
        path: PathBuf,
        /// Actual image length
        len: usize,
    },

    /// Footer hash does not match the payload (raised only under the enforce policy)
    #[error("Firmware hash mismatch in {}: computed {computed}, embedded {embedded}", path.display())]
    HashMismatch {
        /// Image path
        path: PathBuf,
        /// Hex digest of the payload
        computed: String,
        /// Hex value found in the footer
        embedded: String,
    },

    /// A required build output is absent
    #[error("Missing artifact: {name} (expected at {})", path.display())]
    MissingArtifact {
        /// Logical artifact name
        name: String,
        /// Where it was expected
        path: PathBuf,
    },

    /// External tool exited unsuccessfully or could not be spawned
    #[error("External command failed: {command} - {reason}")]
    ExternalCommandFailure {
        /// Rendered command line
        command: String,
        /// Exit status and captured stderr
        reason: String,
    },

    /// Anything else
    #[error("{0}")]
    Generic(String),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },
}

impl PipelineError {
    /// Whether this error aborts the phase that raised it.
    ///
    /// Hash problems and external command failures are advisory; the rest of
    /// the pipeline keeps going after them unless the caller decides otherwise.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PipelineError::HashMismatch { .. }
                | PipelineError::MalformedImage { .. }
                | PipelineError::ExternalCommandFailure { .. }
        )
    }
}

/// Attach an operation description and path to I/O errors.
pub trait ErrorExt<T> {
    /// Wrap the error as [`PipelineError::Fs`].
    fn fs_context(self, operation: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::io::Result<T> {
    fn fs_context(self, operation: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| PipelineError::Fs {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Turn a foreign error into a [`PipelineError::Generic`] prefixed with `msg`.
pub trait Context<T> {
    /// Prefix the failure with `msg`.
    fn context(self, msg: impl Into<String>) -> Result<T>;
}

impl<T, E: std::fmt::Display> Context<T> for std::result::Result<T, E> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Generic(format!("{}: {}", msg.into(), e)))
    }
}

/// Return early with a [`PipelineError::Generic`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::PipelineError::Generic(format!($($arg)*)))
    };
}
