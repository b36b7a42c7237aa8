//! Project configuration from `rnode_build.toml`.
//!
//! Mirrors the build system's project options: which platform, board and
//! variant is being built, where its directories live, and which optional
//! hook steps are enabled. Every field is optional; command-line flags
//! override the file, and [`BuildContextBuilder`] fills in the rest.

use crate::context::{BuildContextBuilder, Features, Platform, resolve_path};
use crate::error::{CliError, ErrorExt, PipelineError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Conventional configuration file name in the project directory.
pub const CONFIG_FILE_NAME: &str = "rnode_build.toml";

/// Parsed `rnode_build.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub project: ProjectSection,
    pub paths: PathsSection,
    pub upload: UploadSection,
    pub features: Features,
    pub tools: ToolsSection,
}

/// `[project]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSection {
    pub platform: Option<String>,
    pub board: Option<String>,
    pub variant: Option<String>,
    pub product_prefix: Option<String>,
    pub program_name: Option<String>,
}

/// `[paths]`. Relative paths are resolved against the project directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsSection {
    pub core_dir: Option<PathBuf>,
    pub packages_dir: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub release_dir: Option<PathBuf>,
    pub build_cache_dir: Option<PathBuf>,
    pub workspace_dir: Option<PathBuf>,
}

/// `[upload]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadSection {
    pub port: Option<String>,
    pub settle_delay_secs: Option<u64>,
}

/// `[tools]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsSection {
    pub provisioning_tool: Option<String>,
}

impl ProjectConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).fs_context("reading configuration", path)?;
        Self::from_toml(&text).map_err(|e| {
            PipelineError::Cli(CliError::InvalidArguments {
                reason: format!("Failed to parse {}: {}", path.display(), e),
            })
        })
    }

    /// Load `rnode_build.toml` from `project_dir` if it exists, defaults otherwise.
    pub fn discover(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            log::debug!("Loading configuration from {}", path.display());
            Self::load(&path)
        } else {
            log::debug!("No {} in {}", CONFIG_FILE_NAME, project_dir.display());
            Ok(Self::default())
        }
    }

    /// Seed a context builder with every value present in the file.
    pub fn apply(&self, project_dir: &Path, mut builder: BuildContextBuilder) -> BuildContextBuilder {
        let resolve = |p: &PathBuf| resolve_path(project_dir, p);

        builder = builder.project_dir(project_dir);

        if let Some(platform) = &self.project.platform {
            builder = builder.platform(Platform::from_name(platform));
        }
        if let Some(board) = &self.project.board {
            builder = builder.board(board);
        }
        if let Some(variant) = &self.project.variant {
            builder = builder.variant(variant);
        }
        if let Some(prefix) = &self.project.product_prefix {
            builder = builder.product_prefix(prefix);
        }
        if let Some(name) = &self.project.program_name {
            builder = builder.program_name(name);
        }

        if let Some(p) = &self.paths.core_dir {
            builder = builder.core_dir(resolve(p));
        }
        if let Some(p) = &self.paths.packages_dir {
            builder = builder.packages_dir(resolve(p));
        }
        if let Some(p) = &self.paths.build_dir {
            builder = builder.build_dir(resolve(p));
        }
        if let Some(p) = &self.paths.release_dir {
            builder = builder.release_dir(resolve(p));
        }
        if let Some(p) = &self.paths.build_cache_dir {
            builder = builder.build_cache_dir(resolve(p));
        }
        if let Some(p) = &self.paths.workspace_dir {
            builder = builder.workspace_dir(resolve(p));
        }

        if let Some(port) = &self.upload.port {
            builder = builder.upload_port(port);
        }
        if let Some(secs) = self.upload.settle_delay_secs {
            builder = builder.settle_delay(Duration::from_secs(secs));
        }
        if let Some(tool) = &self.tools.provisioning_tool {
            builder = builder.provisioning_tool(tool);
        }

        builder.features(self.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ArchiveDestination, HashPolicy};

    const SAMPLE: &str = r#"
[project]
platform = "espressif32"
board = "ttgo-t-beam"
variant = "tbeam"

[paths]
build_dir = ".pio/build/tbeam"
core_dir = "/opt/platformio"

[upload]
port = "/dev/ttyACM0"
settle_delay_secs = 2

[features]
enable_provisioning = true
hash_policy = "enforce"
archive_destination = "release"

[tools]
provisioning_tool = "/usr/local/bin/rnodeconf"
"#;

    #[test]
    fn full_file_builds_context() {
        let config = ProjectConfig::from_toml(SAMPLE).unwrap();
        let ctx = config
            .apply(Path::new("/work/fw"), BuildContextBuilder::new())
            .build()
            .unwrap();

        assert_eq!(ctx.platform(), &Platform::Espressif32);
        assert_eq!(ctx.variant(), "tbeam");
        assert_eq!(ctx.build_dir(), Path::new("/work/fw/.pio/build/tbeam"));
        assert_eq!(ctx.packages_dir(), Path::new("/opt/platformio/packages"));
        assert_eq!(ctx.upload_port(), Some("/dev/ttyACM0"));
        assert_eq!(ctx.settle_delay(), Duration::from_secs(2));
        assert_eq!(ctx.provisioning_tool(), "/usr/local/bin/rnodeconf");

        let features = ctx.features();
        assert!(features.enable_provisioning);
        assert!(!features.enable_post_upload_packaging);
        assert_eq!(features.hash_policy, HashPolicy::Enforce);
        assert_eq!(features.archive_destination, ArchiveDestination::Release);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = ProjectConfig::from_toml("").unwrap();
        assert!(config.project.platform.is_none());
        assert_eq!(config.features, Features::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ProjectConfig::from_toml("[upload]\nspeed = 921600\n").is_err());
    }

    #[test]
    fn misspelled_feature_flags_are_rejected() {
        assert!(ProjectConfig::from_toml("[features]\nenable_provisoning = true\n").is_err());
        assert!(ProjectConfig::from_toml("[features]\nhash_polcy = \"enforce\"\n").is_err());
        assert!(ProjectConfig::from_toml("[features]\nhash_policy = \"enforce\"\n").is_ok());
    }

    #[test]
    fn file_name_parts_from_file_are_validated() {
        let config = ProjectConfig::from_toml(
            r#"
[project]
platform = "espressif32"
board = "ttgo-t-beam"
variant = "beta/nested"
"#,
        )
        .unwrap();
        let err = config
            .apply(Path::new("/work/fw"), BuildContextBuilder::new())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Cli(CliError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn missing_file_discovers_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::discover(dir.path()).unwrap();
        assert!(config.project.board.is_none());
    }
}
