//! Shared fixtures for integration tests

#![allow(dead_code)]

use rnode_build_hooks::context::{BuildContext, BuildContextBuilder, Features, Platform};
use rnode_build_hooks::invoker::{CommandOutcome, ProcessInvoker, ToolCommand};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

pub const PORT: &str = "/dev/ttyUSB0";

/// Records every command instead of running it.
#[derive(Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<ToolCommand>>,
    fail: bool,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command reports exit code 1.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessInvoker for RecordingInvoker {
    async fn execute(&self, command: &ToolCommand) -> CommandOutcome {
        self.calls.lock().unwrap().push(command.clone());
        CommandOutcome {
            command: command.to_string(),
            exit_code: Some(if self.fail { 1 } else { 0 }),
            success: !self.fail,
            stdout: String::new(),
            stderr: if self.fail {
                "device not responding".to_string()
            } else {
                String::new()
            },
        }
    }
}

/// 992 zero bytes followed by their SHA-256.
pub fn valid_image() -> Vec<u8> {
    let payload = vec![0u8; 992];
    let mut image = payload.clone();
    image.extend_from_slice(&Sha256::digest(&payload));
    image
}

/// [`valid_image`] with the last footer byte flipped.
pub fn altered_image() -> Vec<u8> {
    let mut image = valid_image();
    let last = image.len() - 1;
    image[last] ^= 0x01;
    image
}

pub fn valid_hash_hex() -> String {
    hex::encode(Sha256::digest(vec![0u8; 992]))
}

/// Temporary project with a populated build directory.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    /// Project whose build directory holds the three core outputs plus the
    /// linked `.elf`, with `image` as `firmware.bin`.
    pub fn new(image: &[u8]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let project = Self { dir };
        std::fs::create_dir_all(project.build_dir()).unwrap();
        project.write_build("firmware.bin", image);
        project.write_build("bootloader.bin", b"bootloader");
        project.write_build("partitions.bin", b"partitions");
        project.write_build("firmware.elf", b"\x7fELF");
        project
    }

    /// Adds the ESP32 boot-app stub and release tooling.
    pub fn with_esp32_extras(self) -> Self {
        write(
            &self
                .core_dir()
                .join("packages/framework-arduinoespressif32/tools/partitions/boot_app0.bin"),
            b"boot_app0",
        );
        write(&self.release_dir().join("esptool/esptool.py"), b"#!/usr/bin/env python\n");
        write(&self.release_dir().join("console_image.bin"), b"console");
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root().join("build")
    }

    pub fn core_dir(&self) -> PathBuf {
        self.root().join("core")
    }

    pub fn release_dir(&self) -> PathBuf {
        self.root().join("Release")
    }

    pub fn write_build(&self, name: &str, content: &[u8]) {
        write(&self.build_dir().join(name), content);
    }

    pub fn remove_build(&self, name: &str) {
        std::fs::remove_file(self.build_dir().join(name)).unwrap();
    }

    pub fn builder(&self, platform: Platform, board: &str, variant: &str) -> BuildContextBuilder {
        BuildContextBuilder::new()
            .platform(platform)
            .board(board)
            .variant(variant)
            .upload_port(PORT)
            .project_dir(self.root())
            .build_dir(self.build_dir())
            .core_dir(self.core_dir())
            .release_dir(self.release_dir())
            .settle_delay(Duration::ZERO)
    }

    pub fn context(&self, platform: Platform, board: &str, variant: &str) -> BuildContext {
        self.builder(platform, board, variant).build().unwrap()
    }

    pub fn context_with(
        &self,
        platform: Platform,
        board: &str,
        variant: &str,
        features: Features,
    ) -> BuildContext {
        self.builder(platform, board, variant)
            .features(features)
            .build()
            .unwrap()
    }

    /// Names of the files currently in the build directory, sorted.
    pub fn build_listing(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.build_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Member names of the zip at `path`, in archive order.
pub fn zip_members(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    archive.file_names().map(String::from).collect()
}

/// Content of one member of the zip at `path`.
pub fn zip_member(path: &Path, name: &str) -> Vec<u8> {
    use std::io::Read;
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    content
}
