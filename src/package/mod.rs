//! Release packaging.
//!
//! Collects the build outputs of one variant into a single flat archive
//! named `<prefix>_<variant>.zip`:
//!
//! 1. Copy the boot-app stub (ESP32 only) as `<stem>.boot_app0`
//! 2. Copy the flashing tool script and console image from the release directory
//! 3. Copy `firmware.bin`, `bootloader.bin`, `partitions.bin` as `<stem>.bin`,
//!    `<stem>.bootloader`, `<stem>.partitions`
//! 4. Remove any previous archive
//! 5. Compress the staged copies and remove them
//!
//! Required outputs are checked before anything is touched, so a missing
//! input never leaves a partial package behind.

mod archive;
mod artifacts;
mod fs;

pub use archive::{Member, write_archive};
pub use artifacts::{Artifact, ArtifactKind, ArtifactSet};

use crate::{
    context::{ArchiveDestination, BuildContext},
    error::Result,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of a successful packaging run.
#[derive(Clone, Debug, Serialize)]
pub struct PackageReport {
    /// Path of the created archive
    pub archive: PathBuf,
    /// Member names, in archive order
    pub members: Vec<String>,
    /// Optional artifacts that were not available
    pub skipped: Vec<ArtifactKind>,
}

/// Directory the archive goes to for this context.
pub fn archive_dir(ctx: &BuildContext) -> &Path {
    match ctx.features().archive_destination {
        ArchiveDestination::Build => ctx.build_dir(),
        ArchiveDestination::Release => ctx.release_dir(),
    }
}

/// Package the build outputs into the configured archive destination.
pub async fn package(ctx: &BuildContext) -> Result<PackageReport> {
    package_into(ctx, archive_dir(ctx)).await
}

/// Package the build outputs into `dest_dir`.
///
/// # Errors
///
/// [`PipelineError::MissingArtifact`](crate::PipelineError::MissingArtifact)
/// if a core build output is absent; no file is created or removed in that case.
pub async fn package_into(ctx: &BuildContext, dest_dir: &Path) -> Result<PackageReport> {
    log::info!("Building firmware package...");
    log::info!("core_dir: {}", ctx.core_dir().display());
    log::info!("packages_dir: {}", ctx.packages_dir().display());
    log::info!("project_dir: {}", ctx.project_dir().display());
    log::info!("build_dir: {}", ctx.build_dir().display());

    let set = ArtifactSet::for_context(ctx);
    set.check_required()?;

    let mut staged = Vec::new();
    let mut copies = Vec::new();
    let mut skipped = Vec::new();

    let result = match stage(ctx, &set, &mut staged, &mut copies, &mut skipped).await {
        Ok(()) => compress(ctx, dest_dir, &staged).await,
        Err(e) => Err(e),
    };

    for copy in &copies {
        if let Err(e) = fs::remove_file(copy).await {
            log::warn!("Could not remove staged {}: {}", copy.display(), e);
        }
    }

    let archive = result?;
    let mut members: Vec<String> = staged.into_iter().map(|m| m.name).collect();
    members.sort();

    log::info!("Packaged {} files into {}", members.len(), archive.display());
    Ok(PackageReport {
        archive,
        members,
        skipped,
    })
}

/// Replace any previous archive in `dest_dir` with one holding `staged`.
async fn compress(ctx: &BuildContext, dest_dir: &Path, staged: &[Member]) -> Result<PathBuf> {
    let archive = dest_dir.join(ctx.archive_name());
    fs::create_dir_all(dest_dir).await?;
    fs::remove_file(&archive).await?;

    log::info!("Creating {}", archive.display());
    write_archive(&archive, staged.to_vec()).await?;
    Ok(archive)
}

/// Copy every available artifact into the build directory under its package name.
///
/// `copies` collects the files created here, which are removed once compressed.
async fn stage(
    ctx: &BuildContext,
    set: &ArtifactSet,
    staged: &mut Vec<Member>,
    copies: &mut Vec<PathBuf>,
    skipped: &mut Vec<ArtifactKind>,
) -> Result<()> {
    for artifact in set.iter() {
        if !artifact.kind.is_required() && !artifact.source.is_file() {
            log::warn!(
                "Optional {} not found at {}, leaving it out",
                artifact.kind,
                artifact.source.display()
            );
            skipped.push(artifact.kind);
            continue;
        }

        let target = ctx.build_dir().join(&artifact.package_name);
        log::info!(
            "Copying {} -> {}",
            artifact.source.display(),
            target.display()
        );
        fs::copy_file(&artifact.source, &target).await?;
        if artifact.source != target {
            copies.push(target.clone());
        }
        staged.push(Member {
            name: artifact.package_name.clone(),
            path: target,
        });
    }
    Ok(())
}
