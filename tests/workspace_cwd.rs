//! Runs in its own test binary: the working directory is process-wide, so
//! nothing else may extract while it is being observed.

mod common;

use common::{build_archive, VMLINUX, VMLINUX_CONTENT};
use debugsym::{DebugSymError, ExtractionRequest, FileExtractor, ToolsConfig};
use std::env;
use std::fs;
use tempfile::TempDir;

fn tar_tools() -> ToolsConfig {
    ToolsConfig {
        converter: "cat".to_string(),
        converter_args: Vec::new(),
        unpacker: "tar".to_string(),
        unpacker_args: vec!["-xf".to_string(), "-".to_string()],
    }
}

#[test]
fn test_working_directory_is_restored_on_every_path() {
    let temp = TempDir::new().unwrap();
    let workspaces = temp.path().join("workspaces");
    fs::create_dir(&workspaces).unwrap();
    let good = build_archive(temp.path(), "good.tar", true);
    let hollow = build_archive(temp.path(), "hollow.tar", false);

    let extractor = FileExtractor::new(tar_tools()).with_workspace_root(Some(workspaces.clone()));
    let before = env::current_dir().unwrap();

    let destination = temp.path().join("out/vmlinux");
    let extracted = extractor
        .extract(&ExtractionRequest::new(&good, VMLINUX, &destination))
        .unwrap();
    assert!(!extracted.cached);
    assert_eq!(fs::read(&destination).unwrap(), VMLINUX_CONTENT);
    assert_eq!(env::current_dir().unwrap(), before);

    let failed = extractor.extract(&ExtractionRequest::new(
        &hollow,
        VMLINUX,
        temp.path().join("hollow/vmlinux"),
    ));
    assert!(matches!(failed, Err(DebugSymError::ExtractionPipeline { .. })));
    assert!(!temp.path().join("hollow/vmlinux").exists());
    assert_eq!(env::current_dir().unwrap(), before);

    let broken_tools = FileExtractor::new(ToolsConfig {
        unpacker: "debugsym-no-such-unpacker".to_string(),
        ..tar_tools()
    })
    .with_workspace_root(Some(workspaces.clone()));
    let unavailable = broken_tools.extract(&ExtractionRequest::new(
        &good,
        VMLINUX,
        temp.path().join("broken/vmlinux"),
    ));
    assert!(matches!(unavailable, Err(DebugSymError::ToolUnavailable { .. })));
    assert_eq!(env::current_dir().unwrap(), before);

    assert_eq!(fs::read_dir(&workspaces).unwrap().count(), 0);
}
