//! Lifecycle orchestration.
//!
//! Binds the pipeline's steps to the host build lifecycle. Each event is
//! dispatched once per invocation and runs its steps in order:
//!
//! - `pre-upload`: nothing yet, logs the call
//! - `post-upload`: settle delay (only when a device command follows),
//!   optional provisioning, footer hash check (platforms with a hash footer
//!   only), optional packaging
//! - `post-clean`: logs the directories a clean touches
//! - `package`: checks the target's dependency, then packages
//!
//! Steps are independent: a failed hash check does not stop packaging unless
//! the hash policy is `enforce`. Failures are collected in the
//! [`LifecycleReport`] rather than aborting the phase.

mod event;
mod report;

pub use event::{CustomTarget, LifecycleEvent, custom_targets, package_target};
pub use report::{EXIT_COMMAND_FAILED, EXIT_FATAL, EXIT_OK, LifecycleReport, StepError};

use crate::{
    context::{BuildContext, Features, HashPolicy},
    error::PipelineError,
    firmware::{self, ProvisionResult, Verification},
    invoker::ProcessInvoker,
    package,
};
use std::path::{Path, PathBuf};

/// Dispatches lifecycle events to the pipeline steps.
///
/// # Examples
///
/// ```no_run
/// use rnode_build_hooks::context::{BuildContextBuilder, Platform};
/// use rnode_build_hooks::invoker::SystemInvoker;
/// use rnode_build_hooks::lifecycle::{LifecycleEvent, Orchestrator};
///
/// # async fn example() -> rnode_build_hooks::Result<()> {
/// let ctx = BuildContextBuilder::new()
///     .platform(Platform::Espressif32)
///     .board("ttgo-t-beam")
///     .project_dir(".")
///     .upload_port("/dev/ttyACM0")
///     .build()?;
///
/// let report = Orchestrator::new(ctx, SystemInvoker)
///     .dispatch(LifecycleEvent::PostUpload)
///     .await;
/// std::process::exit(report.exit_code());
/// # }
/// ```
#[derive(Debug)]
pub struct Orchestrator<I> {
    ctx: BuildContext,
    invoker: I,
    image: Option<PathBuf>,
}

impl<I: ProcessInvoker> Orchestrator<I> {
    pub fn new(ctx: BuildContext, invoker: I) -> Self {
        Self {
            ctx,
            invoker,
            image: None,
        }
    }

    /// Use `path` as the flashed image instead of `<build_dir>/firmware.bin`.
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = Some(path.into());
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Image the upload flashed.
    pub fn firmware_image(&self) -> PathBuf {
        self.image
            .clone()
            .unwrap_or_else(|| self.ctx.build_dir().join("firmware.bin"))
    }

    /// Run every step bound to `event`.
    pub async fn dispatch(&self, event: LifecycleEvent) -> LifecycleReport {
        let mut report = LifecycleReport::new(event);
        log::info!("{}...", event);

        match event {
            LifecycleEvent::PreUpload => self.pre_upload(),
            LifecycleEvent::PostUpload => self.post_upload(&mut report).await,
            LifecycleEvent::PostClean => self.post_clean(),
            LifecycleEvent::Package => self.package_target(&mut report).await,
        }

        report.finish()
    }

    fn pre_upload(&self) {
        self.log_identity();
    }

    async fn post_upload(&self, report: &mut LifecycleReport) {
        self.log_identity();
        log::info!("Serial port: {}", self.ctx.upload_port().unwrap_or("<unknown>"));

        let features = *self.ctx.features();

        let delay = self.ctx.settle_delay();
        if !delay.is_zero() && self.talks_to_device(&features) {
            log::info!("Waiting {:?} for the device to restart", delay);
            tokio::time::sleep(delay).await;
        }

        if features.enable_provisioning {
            self.run_provision(report).await;
        }

        let hash_ok = if self.ctx.platform().capabilities().has_hash_footer {
            self.run_hash(report, features.hash_policy).await
        } else {
            log::info!(
                "{} images carry no hash footer, skipping hash update",
                self.ctx.platform()
            );
            true
        };

        if features.enable_post_upload_packaging {
            if hash_ok || features.hash_policy == HashPolicy::Advisory {
                self.run_package(report).await;
            } else {
                log::error!("Firmware hash check failed, not packaging");
            }
        }
    }

    fn post_clean(&self) {
        log::info!("build_dir: {}", self.ctx.build_dir().display());
        log::info!("build_cache_dir: {}", self.ctx.build_cache_dir().display());
        log::info!("workspace_dir: {}", self.ctx.workspace_dir().display());
    }

    async fn package_target(&self, report: &mut LifecycleReport) {
        self.log_identity();

        let target = package_target(self.ctx.platform());
        let dependency = PathBuf::from(self.ctx.substitute(&target.dependency));
        if !dependency.is_file() {
            let error = missing(&dependency);
            report.record("package", &error, true);
            return;
        }

        self.run_package(report).await;
    }

    async fn run_provision(&self, report: &mut LifecycleReport) {
        let result = firmware::provision(&self.ctx, &self.invoker).await;
        if let ProvisionResult::Issued { outcome } = &result {
            if let Err(e) = outcome.clone().into_result() {
                report.record("provision", &e, false);
            }
        }
        report.provision = Some(result);
    }

    /// Returns whether the image verified (or verification was not needed).
    async fn run_hash(&self, report: &mut LifecycleReport, policy: HashPolicy) -> bool {
        let enforce = policy == HashPolicy::Enforce;
        let image = self.firmware_image();

        match firmware::verify_and_propagate(&image, &self.ctx, &self.invoker).await {
            Ok(hash) => {
                if let Some(outcome) = &hash.propagation {
                    if let Err(e) = outcome.clone().into_result() {
                        report.record("hash", &e, false);
                    }
                }
                let verified = hash.verification.is_verified();
                if let Verification::Unverified {
                    computed_hex,
                    embedded_hex,
                } = &hash.verification
                {
                    if enforce {
                        let error = PipelineError::HashMismatch {
                            path: image.clone(),
                            computed: computed_hex.clone(),
                            embedded: embedded_hex.clone(),
                        };
                        report.record("hash", &error, true);
                    }
                }
                report.hash = Some(hash);
                verified
            }
            Err(e) => {
                report.record("hash", &e, enforce);
                false
            }
        }
    }

    async fn run_package(&self, report: &mut LifecycleReport) {
        match package::package(&self.ctx).await {
            Ok(pkg) => report.package = Some(pkg),
            Err(e) => report.record("package", &e, e.is_fatal()),
        }
    }

    /// Whether `post-upload` will issue any device command for this context.
    fn talks_to_device(&self, features: &Features) -> bool {
        let platform = self.ctx.platform();
        let provisions = features.enable_provisioning
            && platform.provision_identity(self.ctx.board()).is_some();
        platform.capabilities().has_hash_footer || provisions
    }

    fn log_identity(&self) {
        log::info!("Platform: {}", self.ctx.platform());
        log::info!("Board: {}", self.ctx.board());
        log::info!("Variant: {}", self.ctx.variant());
    }
}

fn missing(path: &Path) -> PipelineError {
    PipelineError::MissingArtifact {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
    }
}
