//! Flat, reproducible zip archive creation.

use crate::{
    bail,
    error::{ErrorExt, PipelineError, Result},
};
use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

/// Permissions recorded for every member.
const MEMBER_MODE: u32 = 0o644;

/// One archive member: name inside the archive and file on disk.
#[derive(Clone, Debug)]
pub struct Member {
    pub name: String,
    pub path: PathBuf,
}

/// Write `members` into a flat zip at `dest`, replacing any existing file.
///
/// Members are sorted by name and stamped with a fixed timestamp and mode,
/// so identical inputs give byte-identical archives. The archive is written
/// next to `dest` and renamed into place once complete; on failure nothing
/// is left at either path.
pub async fn write_archive(dest: &Path, members: Vec<Member>) -> Result<()> {
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || write_archive_blocking(&dest, members))
        .await
        .map_err(|e| PipelineError::Generic(format!("Archive task panicked: {}", e)))?
}

fn write_archive_blocking(dest: &Path, mut members: Vec<Member>) -> Result<()> {
    if members.is_empty() {
        bail!("No files to archive into {}", dest.display());
    }
    members.sort_by(|a, b| a.name.cmp(&b.name));
    members.dedup_by(|a, b| a.name == b.name);

    let partial = partial_path(dest);
    let result = write_members(&partial, &members).and_then(|()| {
        match std::fs::remove_file(dest) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).fs_context("removing previous archive", dest),
        }
        std::fs::rename(&partial, dest).fs_context("moving archive into place", dest)
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

fn write_members(path: &Path, members: &[Member]) -> Result<()> {
    let file = File::create(path).fs_context("creating archive", path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(MEMBER_MODE);

    for member in members {
        log::debug!("  adding {} as {}", member.path.display(), member.name);
        zip.start_file(member.name.as_str(), options)?;
        let mut source = File::open(&member.path).fs_context("opening archive member", &member.path)?;
        io::copy(&mut source, &mut zip).fs_context("compressing", &member.path)?;
    }

    let mut writer = zip.finish()?;
    io::Write::flush(&mut writer).fs_context("flushing archive", path)?;
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sits_next_to_destination() {
        assert_eq!(
            partial_path(Path::new("/tmp/build/rnode_firmware_beta.zip")),
            PathBuf::from("/tmp/build/rnode_firmware_beta.zip.partial")
        );
    }

    #[tokio::test]
    async fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let members = vec![Member {
            name: "gone.bin".into(),
            path: dir.path().join("gone.bin"),
        }];

        assert!(write_archive(&dest, members).await.is_err());
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }
}
