mod common;

use assert_cmd::Command;
use common::{build_archive, write_config, write_index, IndexPackage, VMLINUX, VMLINUX_CONTENT};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn debugsym(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("debugsym").unwrap();
    cmd.current_dir(dir).env_remove("DEBUGSYM_INDEX").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_generate_config() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("generated.toml");

    debugsym(temp.path())
        .args(["--generate-config", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("generated.toml"));

    let content = fs::read_to_string(&config).unwrap();
    assert!(content.contains("[repositories]"));
    assert!(content.contains("rpm2cpio"));
}

#[test]
fn test_invalid_config_exit_code() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("broken.toml");
    fs::write(&config, "[extraction]\nsymbol_file = \"boot/vmlinux\"\n").unwrap();

    debugsym(temp.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .code(5);
}

#[test]
fn test_invalid_package_pattern_exit_code() {
    let temp = TempDir::new().unwrap();
    let index = write_index(temp.path(), &[]);
    let config = write_config(temp.path(), &index, &temp.path().join("kernels"));

    debugsym(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("kernel-debuginfo-[3")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("kernel-debuginfo-[3"));

    assert!(!temp.path().join("cache").exists());
}

#[test]
fn test_dot_symbol_file_exit_code() {
    let temp = TempDir::new().unwrap();
    let index = write_index(temp.path(), &[]);
    let config = write_config(temp.path(), &index, &temp.path().join("kernels"));

    debugsym(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["--symbol-file", ".."])
        .assert()
        .code(5);
}

#[test]
fn test_no_matching_repositories() {
    let temp = TempDir::new().unwrap();
    let index = write_index(temp.path(), &[]);
    let config = write_config(temp.path(), &index, &temp.path().join("kernels"));

    debugsym(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["--enable-repos", "*nomatch*"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("*nomatch*"));
}

#[test]
fn test_missing_output_root() {
    let temp = TempDir::new().unwrap();
    let index = write_index(
        temp.path(),
        &[IndexPackage {
            version: "3.10.0",
            location: "kernel-debuginfo.tar",
            files: &[VMLINUX],
        }],
    );
    let config = write_config(temp.path(), &index, &temp.path().join("missing"));

    debugsym(temp.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("does not exist"));

    assert!(!temp.path().join("cache").exists());
}

#[test]
fn test_extracts_into_relative_output() {
    let temp = TempDir::new().unwrap();
    let index = write_index(
        temp.path(),
        &[IndexPackage {
            version: "3.10.0",
            location: "kernel-debuginfo.tar",
            files: &[VMLINUX],
        }],
    );
    build_archive(&temp.path().join("packages"), "kernel-debuginfo.tar", true);
    let config = write_config(temp.path(), &index, &temp.path().join("unused"));
    fs::create_dir(temp.path().join("kernels")).unwrap();

    let expected = temp
        .path()
        .join("kernels/kernel-debuginfo-3.10.0-1160.el7/vmlinux");

    debugsym(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["--output", "kernels", "--output-format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kernel-debuginfo-3.10.0-1160.el7/vmlinux"));

    assert_eq!(fs::read(&expected).unwrap(), VMLINUX_CONTENT);
}

#[test]
fn test_partial_success_exit_code() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("kernels");
    fs::create_dir(&output).unwrap();
    let index = write_index(
        temp.path(),
        &[
            IndexPackage {
                version: "3.10.0",
                location: "kernel-debuginfo.tar",
                files: &[VMLINUX],
            },
            IndexPackage {
                version: "4.18.0",
                location: "not-mirrored.tar",
                files: &[VMLINUX],
            },
        ],
    );
    build_archive(&temp.path().join("packages"), "kernel-debuginfo.tar", true);
    let config = write_config(temp.path(), &index, &output);

    let assert = debugsym(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["--output-format", "json"])
        .assert()
        .code(2);

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let manifest_line = stdout
        .lines()
        .find(|line| line.contains("\"manifest\""))
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(manifest_line).unwrap();

    assert_eq!(value["manifest"]["entries"].as_array().unwrap().len(), 1);
    assert_eq!(
        value["manifest"]["skipped"][0]["package"],
        "kernel-debuginfo-4.18.0-1160.el7"
    );
    assert_eq!(
        value["manifest"]["skipped"][0]["reason"]["kind"],
        "download_failed"
    );
}

#[test]
fn test_dry_run_downloads_nothing() {
    let temp = TempDir::new().unwrap();
    let index = write_index(
        temp.path(),
        &[IndexPackage {
            version: "3.10.0",
            location: "kernel-debuginfo.tar",
            files: &[VMLINUX],
        }],
    );
    build_archive(&temp.path().join("packages"), "kernel-debuginfo.tar", true);
    let config = write_config(temp.path(), &index, &temp.path().join("kernels"));

    debugsym(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["--dry-run", "--output-format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kernel-debuginfo-3.10.0-1160.el7\t"));

    assert!(!temp.path().join("cache").exists());
    assert!(!temp.path().join("kernels").exists());
}

#[test]
fn test_no_matching_packages_warns() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("kernels");
    fs::create_dir(&output).unwrap();
    let index = write_index(temp.path(), &[]);
    let config = write_config(temp.path(), &index, &output);

    debugsym(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["--output-format", "plain", "kernel-debuginfo-9*"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("WARNING: No packages match kernel-debuginfo-9*"));
}
