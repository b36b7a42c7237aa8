//! Core BuildContext struct and implementations.

use super::{Features, Platform};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// Immutable snapshot of the build environment for one hook invocation.
///
/// Constructed via [`BuildContextBuilder`](super::BuildContextBuilder) and
/// passed by reference into every component, so no component queries the
/// host build system on its own.
///
/// # Examples
///
/// ```no_run
/// use rnode_build_hooks::context::{BuildContextBuilder, Platform};
///
/// # fn example() -> rnode_build_hooks::Result<()> {
/// let ctx = BuildContextBuilder::new()
///     .platform(Platform::Espressif32)
///     .board("ttgo-t-beam")
///     .variant("tbeam")
///     .project_dir("/work/RNode_Firmware")
///     .build()?;
///
/// assert_eq!(ctx.archive_name(), "rnode_firmware_tbeam.zip");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct BuildContext {
    pub(super) platform: Platform,
    pub(super) board: String,
    pub(super) variant: String,
    pub(super) upload_port: Option<String>,
    pub(super) product_prefix: String,
    pub(super) program_name: String,
    pub(super) core_dir: PathBuf,
    pub(super) packages_dir: PathBuf,
    pub(super) project_dir: PathBuf,
    pub(super) build_dir: PathBuf,
    pub(super) release_dir: PathBuf,
    pub(super) build_cache_dir: PathBuf,
    pub(super) workspace_dir: PathBuf,
    pub(super) settle_delay: Duration,
    pub(super) provisioning_tool: String,
    pub(super) features: Features,
}

static VARIABLE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
        .unwrap_or_else(|e| unreachable!("variable pattern is a literal: {e}"))
});

impl BuildContext {
    /// Returns the platform.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Returns the board name.
    pub fn board(&self) -> &str {
        &self.board
    }

    /// Returns the variant used to qualify artifact names.
    ///
    /// Falls back to the board when no variant was configured.
    pub fn variant(&self) -> &str {
        if self.variant.is_empty() {
            &self.board
        } else {
            &self.variant
        }
    }

    /// Returns the serial port of the attached device, if known.
    pub fn upload_port(&self) -> Option<&str> {
        self.upload_port.as_deref()
    }

    pub fn product_prefix(&self) -> &str {
        &self.product_prefix
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn core_dir(&self) -> &Path {
        &self.core_dir
    }

    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Returns the build output directory (`$BUILD_DIR`).
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Returns the project release directory holding auxiliary tooling.
    pub fn release_dir(&self) -> &Path {
        &self.release_dir
    }

    pub fn build_cache_dir(&self) -> &Path {
        &self.build_cache_dir
    }

    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    /// Grace period after flashing before talking to the device again.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Program name (or path) of the provisioning tool.
    pub fn provisioning_tool(&self) -> &str {
        &self.provisioning_tool
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// `<prefix>_<variant>`, the stem shared by every packaged artifact.
    pub fn artifact_stem(&self) -> String {
        format!("{}_{}", self.product_prefix, self.variant())
    }

    /// File name of the distributable archive.
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.artifact_stem())
    }

    /// Project option lookup, as the build system's `GetProjectOption`.
    pub fn get_option(&self, key: &str) -> Option<&str> {
        match key {
            "platform" => Some(self.platform.as_str()),
            "board" => Some(&self.board),
            "variant" => Some(self.variant()),
            _ => None,
        }
    }

    /// Value of a build variable by name, as used in `$VAR` templates.
    pub fn variable(&self, name: &str) -> Option<String> {
        let path = |p: &Path| Some(p.display().to_string());
        match name {
            "BUILD_DIR" => path(&self.build_dir),
            "CORE_DIR" => path(&self.core_dir),
            "PACKAGES_DIR" => path(&self.packages_dir),
            "PROJECT_DIR" => path(&self.project_dir),
            "PLATFORMIO_BUILD_CACHE_DIR" => path(&self.build_cache_dir),
            "PLATFORMIO_WORKSPACE_DIR" => path(&self.workspace_dir),
            "UPLOAD_PORT" => Some(self.upload_port.clone().unwrap_or_default()),
            "PROGNAME" => Some(self.program_name.clone()),
            "PLATFORM" => Some(self.platform.to_string()),
            "BOARD" => Some(self.board.clone()),
            "VARIANT" => Some(self.variant().to_string()),
            _ => None,
        }
    }

    /// Expand `$VAR` and `${VAR}` references in `template`.
    ///
    /// Unknown variables are left untouched.
    pub fn substitute(&self, template: &str) -> String {
        VARIABLE
            .replace_all(template, |caps: &regex::Captures<'_>| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                self.variable(name)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}
