//! Builder for constructing BuildContext.

use super::{BuildContext, Features, Platform};
use crate::error::{CliError, PipelineError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default product prefix of packaged artifacts.
pub const DEFAULT_PRODUCT_PREFIX: &str = "rnode_firmware";

/// Default `$PROGNAME` of the build system.
pub const DEFAULT_PROGRAM_NAME: &str = "firmware";

/// Default provisioning tool.
pub const DEFAULT_PROVISIONING_TOOL: &str = "rnodeconf";

/// Default grace period after flashing.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Builder for constructing [`BuildContext`].
///
/// Only `platform`, `board` and `project_dir` are required; every directory
/// not set explicitly is derived the way the build system lays them out.
///
/// # Examples
///
/// ```no_run
/// use rnode_build_hooks::context::{BuildContextBuilder, Platform};
///
/// # fn example() -> rnode_build_hooks::Result<()> {
/// let ctx = BuildContextBuilder::new()
///     .platform(Platform::NordicNrf52)
///     .board("rak4631")
///     .project_dir(".")
///     .build()?;
/// assert!(ctx.build_dir().ends_with(".pio/build/rak4631"));
/// # Ok(())
/// # }
/// ```
#[derive(Default, Debug, Clone)]
pub struct BuildContextBuilder {
    platform: Option<Platform>,
    board: Option<String>,
    variant: Option<String>,
    upload_port: Option<String>,
    product_prefix: Option<String>,
    program_name: Option<String>,
    core_dir: Option<PathBuf>,
    packages_dir: Option<PathBuf>,
    project_dir: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    release_dir: Option<PathBuf>,
    build_cache_dir: Option<PathBuf>,
    workspace_dir: Option<PathBuf>,
    settle_delay: Option<Duration>,
    provisioning_tool: Option<String>,
    features: Features,
}

impl BuildContextBuilder {
    /// Creates a new context builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the platform. Required.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Sets the board. Required.
    pub fn board(mut self, board: impl Into<String>) -> Self {
        self.board = Some(board.into());
        self
    }

    pub fn variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn upload_port(mut self, port: impl Into<String>) -> Self {
        self.upload_port = Some(port.into());
        self
    }

    pub fn product_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.product_prefix = Some(prefix.into());
        self
    }

    pub fn program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = Some(name.into());
        self
    }

    pub fn core_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.core_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn packages_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.packages_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the project root. Required.
    pub fn project_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn release_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.release_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build_cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn workspace_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.workspace_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    pub fn provisioning_tool(mut self, tool: impl Into<String>) -> Self {
        self.provisioning_tool = Some(tool.into());
        self
    }

    pub fn features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Builds the context.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::MissingArgument`] if `platform`, `board` or
    /// `project_dir` was never set, and [`CliError::InvalidArguments`] if a
    /// value that ends up in artifact file names contains a path separator
    /// or whitespace.
    pub fn build(self) -> Result<BuildContext> {
        let platform = self.platform.ok_or_else(|| missing("platform"))?;
        let board = self
            .board
            .filter(|b| !b.is_empty())
            .ok_or_else(|| missing("board"))?;
        let project_dir = self.project_dir.ok_or_else(|| missing("project_dir"))?;
        let variant = self.variant.unwrap_or_default();
        let product_prefix = self
            .product_prefix
            .unwrap_or_else(|| DEFAULT_PRODUCT_PREFIX.to_string());
        let program_name = self
            .program_name
            .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string());

        check_file_name_part("board", &board)?;
        check_file_name_part("variant", &variant)?;
        check_file_name_part("product_prefix", &product_prefix)?;
        check_file_name_part("program_name", &program_name)?;

        let core_dir = self.core_dir.unwrap_or_else(default_core_dir);
        let packages_dir = self
            .packages_dir
            .unwrap_or_else(|| core_dir.join("packages"));
        let build_cache_dir = self
            .build_cache_dir
            .unwrap_or_else(|| core_dir.join(".cache"));
        let workspace_dir = self
            .workspace_dir
            .unwrap_or_else(|| project_dir.join(".pio"));
        let build_dir = self.build_dir.unwrap_or_else(|| {
            let env_name = if variant.is_empty() { &board } else { &variant };
            workspace_dir.join("build").join(env_name)
        });
        let release_dir = self
            .release_dir
            .unwrap_or_else(|| project_dir.join("Release"));

        Ok(BuildContext {
            platform,
            board,
            variant,
            upload_port: self.upload_port.filter(|p| !p.is_empty()),
            product_prefix,
            program_name,
            core_dir,
            packages_dir,
            project_dir,
            build_dir,
            release_dir,
            build_cache_dir,
            workspace_dir,
            settle_delay: self.settle_delay.unwrap_or(DEFAULT_SETTLE_DELAY),
            provisioning_tool: self
                .provisioning_tool
                .unwrap_or_else(|| DEFAULT_PROVISIONING_TOOL.to_string()),
            features: self.features,
        })
    }
}

fn missing(argument: &str) -> PipelineError {
    PipelineError::Cli(CliError::MissingArgument {
        argument: argument.to_string(),
    })
}

/// Values used to form file names must stay a single path component.
fn check_file_name_part(name: &str, value: &str) -> Result<()> {
    if value.contains(['/', '\\']) || value.contains(char::is_whitespace) {
        return Err(PipelineError::Cli(CliError::InvalidArguments {
            reason: format!(
                "Invalid {}: {:?}. It is used in file names and cannot contain \
                 path separators or whitespace",
                name, value
            ),
        }));
    }
    Ok(())
}

/// `~/.platformio`, or a relative `.platformio` when no home is known.
fn default_core_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".platformio"))
        .unwrap_or_else(|| PathBuf::from(".platformio"))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Expand `~` in `path` and resolve it against `base` when relative.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    let path = expand_home(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
