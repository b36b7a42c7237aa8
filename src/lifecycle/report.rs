//! What a lifecycle phase did.

use super::LifecycleEvent;
use crate::{
    error::PipelineError,
    firmware::{HashReport, ProvisionResult},
    package::PackageReport,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Exit code for a phase that completed cleanly.
pub const EXIT_OK: i32 = 0;
/// Exit code when a step failed fatally.
pub const EXIT_FATAL: i32 = 1;
/// Exit code when only external commands failed.
pub const EXIT_COMMAND_FAILED: i32 = 2;

/// A step failure recorded instead of aborting the whole phase.
#[derive(Clone, Debug, Serialize)]
pub struct StepError {
    /// Step that failed: `hash`, `provision`, `package`, ...
    pub step: &'static str,
    pub message: String,
    pub fatal: bool,
    pub external_command: bool,
}

/// Summary of one [`LifecycleEvent`] dispatch.
#[derive(Clone, Debug, Serialize)]
pub struct LifecycleReport {
    pub event: LifecycleEvent,
    pub completed_at: Option<DateTime<Utc>>,
    pub hash: Option<HashReport>,
    pub provision: Option<ProvisionResult>,
    pub package: Option<PackageReport>,
    pub errors: Vec<StepError>,
}

impl LifecycleReport {
    pub fn new(event: LifecycleEvent) -> Self {
        Self {
            event,
            completed_at: None,
            hash: None,
            provision: None,
            package: None,
            errors: Vec::new(),
        }
    }

    /// Record a failure of `step`. `fatal` overrides the error's own classification.
    pub fn record(&mut self, step: &'static str, error: &PipelineError, fatal: bool) {
        let external_command = matches!(error, PipelineError::ExternalCommandFailure { .. });
        if fatal {
            log::error!("{} failed: {}", step, error);
        } else {
            log::warn!("{} failed: {}", step, error);
        }
        self.errors.push(StepError {
            step,
            message: error.to_string(),
            fatal,
            external_command,
        });
    }

    pub(super) fn finish(mut self) -> Self {
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn has_fatal_error(&self) -> bool {
        self.errors.iter().any(|e| e.fatal)
    }

    /// Process exit code for this report.
    pub fn exit_code(&self) -> i32 {
        if self.has_fatal_error() {
            EXIT_FATAL
        } else if self.errors.iter().any(|e| e.external_command) {
            EXIT_COMMAND_FAILED
        } else {
            EXIT_OK
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_prefers_fatal() {
        let mut report = LifecycleReport::new(LifecycleEvent::PostUpload);
        assert_eq!(report.exit_code(), EXIT_OK);

        report.record(
            "hash",
            &PipelineError::ExternalCommandFailure {
                command: "rnodeconf".into(),
                reason: "exit code 1".into(),
            },
            false,
        );
        assert_eq!(report.exit_code(), EXIT_COMMAND_FAILED);

        report.record("package", &PipelineError::Generic("boom".into()), true);
        assert_eq!(report.exit_code(), EXIT_FATAL);
    }
}
