mod common;

use common::{Project, valid_image, zip_member, zip_members};
use rnode_build_hooks::PipelineError;
use rnode_build_hooks::context::{ArchiveDestination, Features, Platform};
use rnode_build_hooks::package::{self, ArtifactKind};

const CORE_MEMBERS: [&str; 3] = [
    "rnode_firmware_beta.bin",
    "rnode_firmware_beta.bootloader",
    "rnode_firmware_beta.partitions",
];

#[tokio::test]
async fn packages_renamed_core_outputs() {
    let project = Project::new(&valid_image());
    let before = project.build_listing();
    let ctx = project.context(Platform::NordicNrf52, "rak4631", "beta");

    let report = package::package(&ctx).await.unwrap();

    assert_eq!(report.archive, project.build_dir().join("rnode_firmware_beta.zip"));
    assert_eq!(report.members, CORE_MEMBERS);
    assert!(report.skipped.is_empty());

    let members = zip_members(&report.archive);
    assert_eq!(members, CORE_MEMBERS);
    assert!(!members.iter().any(|m| m == "firmware.bin"));
    assert_eq!(zip_member(&report.archive, "rnode_firmware_beta.bin"), valid_image());
    assert_eq!(
        zip_member(&report.archive, "rnode_firmware_beta.bootloader"),
        b"bootloader"
    );

    // staged copies are gone, inputs untouched
    let mut after = before.clone();
    after.push("rnode_firmware_beta.zip".to_string());
    after.sort();
    assert_eq!(project.build_listing(), after);
}

#[tokio::test]
async fn esp32_package_includes_stub_and_release_tools() {
    let project = Project::new(&valid_image()).with_esp32_extras();
    let ctx = project.context(Platform::Espressif32, "ttgo-t-beam", "beta");

    let report = package::package(&ctx).await.unwrap();

    assert_eq!(
        zip_members(&report.archive),
        vec![
            "console_image.bin",
            "esptool.py",
            "rnode_firmware_beta.bin",
            "rnode_firmware_beta.boot_app0",
            "rnode_firmware_beta.bootloader",
            "rnode_firmware_beta.partitions",
        ]
    );
    assert_eq!(
        zip_member(&report.archive, "rnode_firmware_beta.boot_app0"),
        b"boot_app0"
    );
    assert!(!project.build_dir().join("esptool.py").exists());
}

#[tokio::test]
async fn esp32_package_leaves_out_missing_optionals() {
    let project = Project::new(&valid_image());
    let ctx = project.context(Platform::Espressif32, "ttgo-t-beam", "beta");

    let report = package::package(&ctx).await.unwrap();

    assert_eq!(zip_members(&report.archive), CORE_MEMBERS);
    assert_eq!(
        report.skipped,
        vec![
            ArtifactKind::BootAppStub,
            ArtifactKind::ToolScript,
            ArtifactKind::ConsoleImage,
        ]
    );
}

#[tokio::test]
async fn repeated_packaging_is_byte_identical() {
    let project = Project::new(&valid_image()).with_esp32_extras();
    let ctx = project.context(Platform::Espressif32, "ttgo-t-beam", "beta");

    let first = package::package(&ctx).await.unwrap();
    let first_bytes = std::fs::read(&first.archive).unwrap();
    let second = package::package(&ctx).await.unwrap();
    let second_bytes = std::fs::read(&second.archive).unwrap();

    assert_eq!(first.archive, second.archive);
    assert_eq!(first_bytes, second_bytes);
}

#[tokio::test]
async fn previous_archive_is_replaced() {
    let project = Project::new(&valid_image());
    project.write_build("rnode_firmware_beta.zip", b"stale, not a zip");
    let ctx = project.context(Platform::NordicNrf52, "rak4631", "beta");

    let report = package::package(&ctx).await.unwrap();

    assert_eq!(zip_members(&report.archive), CORE_MEMBERS);
}

#[tokio::test]
async fn missing_core_output_creates_nothing() {
    let project = Project::new(&valid_image());
    project.remove_build("bootloader.bin");
    let before = project.build_listing();
    let ctx = project.context(Platform::NordicNrf52, "rak4631", "beta");

    match package::package(&ctx).await {
        Err(PipelineError::MissingArtifact { name, path }) => {
            assert_eq!(name, "bootloader.bin");
            assert_eq!(path, project.build_dir().join("bootloader.bin"));
        }
        other => panic!("expected MissingArtifact, got {:?}", other),
    }

    assert_eq!(project.build_listing(), before);
}

#[tokio::test]
async fn release_destination_writes_into_release_dir() {
    let project = Project::new(&valid_image());
    let features = Features {
        archive_destination: ArchiveDestination::Release,
        ..Features::default()
    };
    let ctx = project.context_with(Platform::NordicNrf52, "rak4631", "beta", features);

    let report = package::package(&ctx).await.unwrap();

    assert_eq!(
        report.archive,
        project.release_dir().join("rnode_firmware_beta.zip")
    );
    assert!(!project.build_dir().join("rnode_firmware_beta.zip").exists());
}

#[tokio::test]
async fn variant_defaults_to_board() {
    let project = Project::new(&valid_image());
    let ctx = project
        .builder(Platform::NordicNrf52, "rak4631", "")
        .build()
        .unwrap();

    let report = package::package(&ctx).await.unwrap();

    assert_eq!(
        report.archive.file_name().unwrap(),
        "rnode_firmware_rak4631.zip"
    );
}
