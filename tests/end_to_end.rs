mod common;

use common::{build_archive, write_config, write_index, IndexPackage, VMLINUX, VMLINUX_CONTENT};
use debugsym::extractor::SkipReason;
use debugsym::{run_batch, Config, GracefulShutdown};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_batch_from_configuration_file() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("kernels");
    fs::create_dir(&output).unwrap();

    let index = write_index(
        temp.path(),
        &[
            IndexPackage {
                version: "3.10.0",
                location: "Packages/kernel-debuginfo-3.10.0.tar",
                files: &["/usr/share/doc/kernel/COPYING", VMLINUX],
            },
            IndexPackage {
                version: "4.18.0",
                location: "Packages/kernel-debuginfo-4.18.0.tar",
                files: &["/usr/share/doc/kernel/COPYING"],
            },
        ],
    );
    let packages = temp.path().join("packages/Packages");
    fs::create_dir_all(&packages).unwrap();
    build_archive(&packages, "kernel-debuginfo-3.10.0.tar", true);
    build_archive(&packages, "kernel-debuginfo-4.18.0.tar", false);

    let config = Config::load_from_file(write_config(temp.path(), &index, &output)).unwrap();
    config.validate().unwrap();

    let manifest = run_batch(
        &config,
        &config.extraction.package_pattern,
        GracefulShutdown::new_for_test(),
        None,
    )
    .unwrap();

    let expected = output.join("kernel-debuginfo-3.10.0-1160.el7/vmlinux");
    assert_eq!(manifest.paths().collect::<Vec<_>>(), vec![&expected]);
    assert_eq!(fs::read(&expected).unwrap(), VMLINUX_CONTENT);

    assert_eq!(manifest.skipped.len(), 1);
    assert!(matches!(
        manifest.skipped[0].reason,
        SkipReason::NoSymbolFile { .. }
    ));
    assert_eq!(manifest.failures().count(), 0);

    // Only the package carrying vmlinux was fetched.
    let cached: Vec<_> = fs::read_dir(&config.download.cache_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(cached, vec!["kernel-debuginfo-3.10.0.tar"]);

    // A second run finds the extraction and skips the download entirely.
    fs::remove_dir_all(&config.download.cache_dir).unwrap();
    let again = run_batch(
        &config,
        "kernel-debuginfo-3.10.0*",
        GracefulShutdown::new_for_test(),
        None,
    )
    .unwrap();

    assert_eq!(again.len(), 1);
    assert!(again.entries[0].cached);
    assert!(!config.download.cache_dir.exists());
}

#[test]
fn test_cancelled_batch() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("kernels");
    fs::create_dir(&output).unwrap();
    let index = write_index(
        temp.path(),
        &[IndexPackage {
            version: "3.10.0",
            location: "kernel-debuginfo.tar",
            files: &[VMLINUX],
        }],
    );
    let config = Config::load_from_file(write_config(temp.path(), &index, &output)).unwrap();

    let shutdown = GracefulShutdown::new_for_test();
    shutdown.request_shutdown();

    let result = run_batch(&config, "kernel-debuginfo", shutdown, None);
    assert!(matches!(result, Err(debugsym::DebugSymError::Cancelled)));
    assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
}
