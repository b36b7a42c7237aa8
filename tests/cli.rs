mod common;

use assert_cmd::Command;
use common::{Project, altered_image, valid_image, zip_members};
use predicates::prelude::*;

const PROJECT_ENV: [&str; 8] = [
    "PROJECT_DIR",
    "PLATFORM",
    "BOARD",
    "VARIANT",
    "UPLOAD_PORT",
    "BUILD_DIR",
    "CORE_DIR",
    "PACKAGES_DIR",
];

fn hooks() -> Command {
    let mut cmd = Command::cargo_bin("rnode_build_hooks").unwrap();
    for var in PROJECT_ENV {
        cmd.env_remove(var);
    }
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn targets_lists_package_target() {
    hooks()
        .args(["--platform", "espressif32", "targets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("package\t$BUILD_DIR/${PROGNAME}.elf\tPackage"));
}

#[test]
fn targets_as_json() {
    hooks()
        .args(["--platform", "nordicnrf52", "--json", "targets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dependency\": \"$BUILD_DIR/${PROGNAME}.bin\""));
}

#[test]
fn verify_exit_codes() {
    let good = Project::new(&valid_image());
    hooks()
        .arg("verify")
        .arg(good.build_dir().join("firmware.bin"))
        .assert()
        .code(0);

    let bad = Project::new(&altered_image());
    hooks()
        .arg("verify")
        .arg(bad.build_dir().join("firmware.bin"))
        .assert()
        .code(1);

    let short = Project::new(b"too short");
    hooks()
        .arg("verify")
        .arg(short.build_dir().join("firmware.bin"))
        .assert()
        .code(1);
}

#[test]
fn package_from_config_file() {
    let project = Project::new(&valid_image());
    common::write(
        &project.root().join("rnode_build.toml"),
        br#"
[project]
platform = "nordicnrf52"
board = "rak4631"
variant = "beta"

[paths]
build_dir = "build"
"#,
    );

    hooks()
        .arg("--project-dir")
        .arg(project.root())
        .arg("package")
        .assert()
        .success();

    let archive = project.build_dir().join("rnode_firmware_beta.zip");
    assert_eq!(zip_members(&archive).len(), 3);
}

#[test]
fn package_without_outputs_fails() {
    let project = Project::new(&valid_image());
    project.remove_build("partitions.bin");

    hooks()
        .arg("--project-dir")
        .arg(project.root())
        .args(["--platform", "nordicnrf52", "--board", "rak4631", "--build-dir", "build"])
        .arg("package")
        .assert()
        .code(1);
}

#[test]
fn variant_with_separator_is_rejected() {
    hooks()
        .args(["--platform", "espressif32", "--board", "ttgo-t-beam", "--variant", "../x"])
        .arg("package")
        .assert()
        .failure()
        .stderr(predicate::str::contains("variant"));
}

#[test]
fn nested_variant_from_config_is_rejected() {
    let project = Project::new(&valid_image());
    common::write(
        &project.root().join("rnode_build.toml"),
        br#"
[project]
platform = "nordicnrf52"
board = "rak4631"
variant = "beta/nested"

[paths]
build_dir = "build"
"#,
    );
    let before = project.build_listing();

    hooks()
        .arg("--project-dir")
        .arg(project.root())
        .arg("package")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("variant"));

    assert_eq!(project.build_listing(), before);
}

#[test]
fn misspelled_feature_in_config_fails() {
    let project = Project::new(&valid_image());
    common::write(
        &project.root().join("rnode_build.toml"),
        br#"
[project]
platform = "espressif32"
board = "ttgo-t-beam"

[features]
hash_polcy = "enforce"
"#,
    );

    hooks()
        .arg("--project-dir")
        .arg(project.root())
        .arg("pre-upload")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hash_polcy"));
}

#[test]
fn missing_board_is_reported() {
    let project = Project::new(&valid_image());
    hooks()
        .arg("--project-dir")
        .arg(project.root())
        .args(["--platform", "espressif32"])
        .arg("pre-upload")
        .assert()
        .failure()
        .stderr(predicate::str::contains("board"));
}
