//! The set of files that make up a firmware release package.

use crate::{
    context::BuildContext,
    error::{PipelineError, Result},
};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Role of a file inside the package.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Firmware,
    Bootloader,
    Partitions,
    BootAppStub,
    ToolScript,
    ConsoleImage,
}

impl ArtifactKind {
    /// Core build outputs must exist; everything else is optional.
    pub fn is_required(self) -> bool {
        matches!(
            self,
            ArtifactKind::Firmware | ArtifactKind::Bootloader | ArtifactKind::Partitions
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Firmware => "firmware",
            ArtifactKind::Bootloader => "bootloader",
            ArtifactKind::Partitions => "partitions",
            ArtifactKind::BootAppStub => "boot_app_stub",
            ArtifactKind::ToolScript => "tool_script",
            ArtifactKind::ConsoleImage => "console_image",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file to stage: where it comes from and what it is called in the package.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub source: PathBuf,
    pub package_name: String,
}

/// All candidate members of a package for one build context.
///
/// Listed in staging order: boot-app stub, release tooling, then the
/// renamed core outputs.
#[derive(Clone, Debug, Default)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    /// Resolve every artifact the context's platform contributes.
    pub fn for_context(ctx: &BuildContext) -> Self {
        let stem = ctx.artifact_stem();
        let build_dir = ctx.build_dir();
        let mut artifacts = Vec::new();

        if ctx.platform().capabilities().has_boot_app_stub {
            if let Some(rel) = ctx.platform().boot_app_stub_source() {
                artifacts.push(Artifact {
                    kind: ArtifactKind::BootAppStub,
                    source: ctx.packages_dir().join(rel),
                    package_name: format!("{stem}.boot_app0"),
                });
            }
        }

        for (rel, name) in ctx.platform().release_tools() {
            let kind = if name.ends_with(".py") {
                ArtifactKind::ToolScript
            } else {
                ArtifactKind::ConsoleImage
            };
            artifacts.push(Artifact {
                kind,
                source: ctx.release_dir().join(rel),
                package_name: (*name).to_string(),
            });
        }

        for (kind, file, ext) in [
            (ArtifactKind::Firmware, "firmware.bin", "bin"),
            (ArtifactKind::Bootloader, "bootloader.bin", "bootloader"),
            (ArtifactKind::Partitions, "partitions.bin", "partitions"),
        ] {
            artifacts.push(Artifact {
                kind,
                source: build_dir.join(file),
                package_name: format!("{stem}.{ext}"),
            });
        }

        Self { artifacts }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    pub fn get(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    /// Fail with [`PipelineError::MissingArtifact`] on the first absent required file.
    pub fn check_required(&self) -> Result<()> {
        for artifact in self.artifacts.iter().filter(|a| a.kind.is_required()) {
            if !artifact.source.is_file() {
                return Err(PipelineError::MissingArtifact {
                    name: artifact
                        .source
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| artifact.kind.to_string()),
                    path: artifact.source.clone(),
                });
            }
        }
        Ok(())
    }
}
